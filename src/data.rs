//! The immutable data repository handed to each battle session.
//!
//! Move and species tables are loaded (or built) once, wrapped in an
//! [`DataRepository`] and shared by `Arc`; no component reaches for a
//! process-global table.

use crate::errors::{DataError, DataResult};
use schema::{
    BaseStats, EffectTarget, MoveCategory, MoveData, MoveEffect, MoveId, PokemonType, SpeciesData,
    SpeciesId, StatType, StatusType, VolatileType,
};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Move id reserved for the fallback attack used when no move has PP left.
pub const STRUGGLE: MoveId = MoveId(165);

/// Immutable lookup tables for one process. Constructed explicitly and
/// passed into sessions at creation time.
#[derive(Debug, Clone)]
pub struct DataRepository {
    species: HashMap<SpeciesId, SpeciesData>,
    moves: HashMap<MoveId, MoveData>,
}

impl DataRepository {
    pub fn new(species: Vec<SpeciesData>, moves: Vec<MoveData>) -> Self {
        Self {
            species: species.into_iter().map(|s| (s.id, s)).collect(),
            moves: moves.into_iter().map(|m| (m.id, m)).collect(),
        }
    }

    pub fn species(&self, id: SpeciesId) -> DataResult<&SpeciesData> {
        self.species.get(&id).ok_or(DataError::SpeciesNotFound(id))
    }

    pub fn move_data(&self, id: MoveId) -> DataResult<&MoveData> {
        self.moves.get(&id).ok_or(DataError::MoveNotFound(id))
    }

    pub fn species_count(&self) -> usize {
        self.species.len()
    }

    /// Load additional species definitions from a directory of RON files
    /// (one species per file).
    pub fn load_species_dir(&mut self, dir: &Path) -> DataResult<usize> {
        let entries = fs::read_dir(dir)
            .map_err(|e| DataError::MalformedData(format!("{}: {}", dir.display(), e)))?;

        let mut loaded = 0;
        for entry in entries {
            let entry =
                entry.map_err(|e| DataError::MalformedData(format!("{}: {}", dir.display(), e)))?;
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("ron") {
                continue;
            }
            let content = fs::read_to_string(&path)
                .map_err(|e| DataError::MalformedData(format!("{}: {}", path.display(), e)))?;
            let species: SpeciesData = ron::from_str(&content)
                .map_err(|e| DataError::MalformedData(format!("{}: {}", path.display(), e)))?;
            self.species.insert(species.id, species);
            loaded += 1;
        }
        Ok(loaded)
    }

    /// The built-in demo data set: enough species and moves for trainer
    /// rosters, wild spawns and the test suite.
    pub fn demo() -> Self {
        Self::new(demo_species(), demo_moves())
    }
}

pub mod species_ids {
    use schema::SpeciesId;

    pub const BULBASAUR: SpeciesId = SpeciesId(1);
    pub const CHARMANDER: SpeciesId = SpeciesId(4);
    pub const SQUIRTLE: SpeciesId = SpeciesId(7);
    pub const PIDGEY: SpeciesId = SpeciesId(16);
    pub const RATTATA: SpeciesId = SpeciesId(19);
    pub const PIKACHU: SpeciesId = SpeciesId(25);
    pub const GEODUDE: SpeciesId = SpeciesId(74);
    pub const GASTLY: SpeciesId = SpeciesId(92);
    pub const ONIX: SpeciesId = SpeciesId(95);
    pub const ARTICUNO: SpeciesId = SpeciesId(144);
}

pub mod move_ids {
    use schema::MoveId;

    pub const POUND: MoveId = MoveId(1);
    pub const TACKLE: MoveId = MoveId(33);
    pub const TAIL_WHIP: MoveId = MoveId(39);
    pub const QUICK_ATTACK: MoveId = MoveId(98);
    pub const EMBER: MoveId = MoveId(52);
    pub const WATER_GUN: MoveId = MoveId(55);
    pub const VINE_WHIP: MoveId = MoveId(22);
    pub const THUNDER_SHOCK: MoveId = MoveId(84);
    pub const THUNDER_WAVE: MoveId = MoveId(86);
    pub const SLEEP_POWDER: MoveId = MoveId(79);
    pub const LICK: MoveId = MoveId(122);
    pub const BITE: MoveId = MoveId(44);
    pub const CONFUSE_RAY: MoveId = MoveId(109);
    pub const ROCK_THROW: MoveId = MoveId(88);
    pub const SLASH: MoveId = MoveId(163);
    pub const RECOVER: MoveId = MoveId(105);
    pub const GROWL: MoveId = MoveId(45);
    pub const COUNTER: MoveId = MoveId(68);
}

fn species(
    id: SpeciesId,
    name: &str,
    types: &[PokemonType],
    stats: [u8; 6],
    catch_rate: u8,
    base_exp: u16,
) -> SpeciesData {
    SpeciesData {
        id,
        name: name.to_string(),
        types: types.to_vec(),
        base_stats: BaseStats {
            hp: stats[0],
            attack: stats[1],
            defense: stats[2],
            sp_attack: stats[3],
            sp_defense: stats[4],
            speed: stats[5],
        },
        catch_rate,
        base_exp,
    }
}

fn demo_species() -> Vec<SpeciesData> {
    use schema::PokemonType::*;
    use species_ids::*;

    vec![
        species(BULBASAUR, "Bulbasaur", &[Grass, Poison], [45, 49, 49, 65, 65, 45], 45, 64),
        species(CHARMANDER, "Charmander", &[Fire], [39, 52, 43, 60, 50, 65], 45, 62),
        species(SQUIRTLE, "Squirtle", &[Water], [44, 48, 65, 50, 64, 43], 45, 63),
        species(PIDGEY, "Pidgey", &[Normal, Flying], [40, 45, 40, 35, 35, 56], 255, 50),
        species(RATTATA, "Rattata", &[Normal], [30, 56, 35, 25, 35, 72], 255, 51),
        species(PIKACHU, "Pikachu", &[Electric], [35, 55, 40, 50, 50, 90], 190, 112),
        species(GEODUDE, "Geodude", &[Rock, Ground], [40, 80, 100, 30, 30, 20], 255, 60),
        species(GASTLY, "Gastly", &[Ghost, Poison], [30, 35, 30, 100, 35, 80], 190, 62),
        species(ONIX, "Onix", &[Rock, Ground], [35, 45, 160, 30, 45, 70], 45, 77),
        species(ARTICUNO, "Articuno", &[Ice, Flying], [90, 85, 100, 95, 125, 85], 3, 261),
    ]
}

fn attack(
    id: MoveId,
    name: &str,
    move_type: PokemonType,
    category: MoveCategory,
    power: u8,
    accuracy: Option<u8>,
    max_pp: u8,
    priority: i8,
    effects: Vec<MoveEffect>,
) -> MoveData {
    MoveData {
        id,
        name: name.to_string(),
        move_type,
        category,
        power: Some(power),
        accuracy,
        max_pp,
        priority,
        effects,
    }
}

fn status_move(
    id: MoveId,
    name: &str,
    move_type: PokemonType,
    accuracy: Option<u8>,
    max_pp: u8,
    effects: Vec<MoveEffect>,
) -> MoveData {
    MoveData {
        id,
        name: name.to_string(),
        move_type,
        category: MoveCategory::Status,
        power: None,
        accuracy,
        max_pp,
        priority: 0,
        effects,
    }
}

fn demo_moves() -> Vec<MoveData> {
    use move_ids::*;
    use schema::MoveCategory::*;
    use schema::PokemonType::*;

    vec![
        attack(POUND, "Pound", Normal, Physical, 40, Some(100), 35, 0, vec![]),
        attack(TACKLE, "Tackle", Normal, Physical, 40, Some(100), 35, 0, vec![]),
        attack(
            QUICK_ATTACK,
            "Quick Attack",
            Normal,
            Physical,
            40,
            Some(100),
            30,
            1,
            vec![],
        ),
        attack(
            EMBER,
            "Ember",
            Fire,
            Special,
            40,
            Some(100),
            25,
            0,
            vec![MoveEffect::Ailment { status: StatusType::Burn, chance: 10 }],
        ),
        attack(WATER_GUN, "Water Gun", Water, Special, 40, Some(100), 25, 0, vec![]),
        attack(VINE_WHIP, "Vine Whip", Grass, Physical, 45, Some(100), 25, 0, vec![]),
        attack(
            THUNDER_SHOCK,
            "Thunder Shock",
            Electric,
            Special,
            40,
            Some(100),
            30,
            0,
            vec![MoveEffect::Ailment { status: StatusType::Paralysis, chance: 10 }],
        ),
        attack(ROCK_THROW, "Rock Throw", Rock, Physical, 50, Some(90), 15, 0, vec![]),
        attack(
            BITE,
            "Bite",
            Normal,
            Physical,
            60,
            Some(100),
            25,
            0,
            vec![MoveEffect::Volatile { condition: VolatileType::Flinch, chance: 10 }],
        ),
        attack(
            SLASH,
            "Slash",
            Normal,
            Physical,
            70,
            Some(100),
            20,
            0,
            vec![MoveEffect::HighCrit],
        ),
        attack(
            LICK,
            "Lick",
            Ghost,
            Physical,
            30,
            Some(100),
            30,
            0,
            vec![MoveEffect::Ailment { status: StatusType::Paralysis, chance: 30 }],
        ),
        attack(
            COUNTER,
            "Counter",
            Fighting,
            Physical,
            60,
            Some(100),
            20,
            -1,
            vec![],
        ),
        attack(
            STRUGGLE,
            "Struggle",
            Typeless,
            Physical,
            50,
            None,
            1,
            0,
            vec![MoveEffect::Recoil { percent: 25 }],
        ),
        status_move(
            TAIL_WHIP,
            "Tail Whip",
            Normal,
            Some(100),
            30,
            vec![MoveEffect::StatChange {
                target: EffectTarget::Target,
                stat: StatType::Defense,
                stages: -1,
                chance: 100,
            }],
        ),
        status_move(
            GROWL,
            "Growl",
            Normal,
            Some(100),
            40,
            vec![MoveEffect::StatChange {
                target: EffectTarget::Target,
                stat: StatType::Attack,
                stages: -1,
                chance: 100,
            }],
        ),
        status_move(
            THUNDER_WAVE,
            "Thunder Wave",
            Electric,
            Some(90),
            20,
            vec![MoveEffect::Ailment { status: StatusType::Paralysis, chance: 100 }],
        ),
        status_move(
            SLEEP_POWDER,
            "Sleep Powder",
            Grass,
            Some(75),
            15,
            vec![MoveEffect::Ailment { status: StatusType::Sleep, chance: 100 }],
        ),
        status_move(
            CONFUSE_RAY,
            "Confuse Ray",
            Ghost,
            Some(100),
            10,
            vec![MoveEffect::Volatile { condition: VolatileType::Confusion, chance: 100 }],
        ),
        status_move(
            RECOVER,
            "Recover",
            Normal,
            None,
            10,
            vec![MoveEffect::Heal { percent: 50 }],
        ),
    ]
}

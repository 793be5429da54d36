mod common;

mod test_ordering;
mod test_resolve_turn;
mod test_session;
mod test_volatiles;

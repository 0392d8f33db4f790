// ============================================================================
// Actors Module
// ============================================================================
//
// Actors are reserved for infrastructure concerns. Domain logic runs in
// plain services and bus handlers.
//
// ============================================================================

mod dead_letter;

pub use dead_letter::{
    AddDeadLetter, DeadLetter, DeadLetterActor, DeadLetterReport, GetDeadLetters, DEFAULT_CAPACITY,
};

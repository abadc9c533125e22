pub mod card;
pub mod category;
pub mod choice;
pub mod clue;
pub mod roster;

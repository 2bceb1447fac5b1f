// Queue state machine plus everything needed to actually play it

pub mod controller;
pub mod queue;
pub mod surface;

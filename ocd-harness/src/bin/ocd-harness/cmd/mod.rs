pub mod breakpoint;
pub mod expect_bits;
pub mod halt;
pub mod inspect;
pub mod raw;
pub mod read;
pub mod reset;
pub mod resume;
pub mod server;
pub mod write;

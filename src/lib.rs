pub mod codetables;
mod cube;
mod error;
mod grid;
mod helpers;
mod level;
mod load;
mod message;
mod packing;
mod param;
mod rules;
mod save;
mod scaled;
mod sections;
mod time;
mod units;

pub use crate::{
    cube::*, error::*, grid::*, level::*, load::*, message::*, packing::SimplePackingParam,
    save::*, scaled::*, sections::*, time::*, units::*,
};

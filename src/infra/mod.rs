mod default_observer;
mod game_observer;
mod pathfinding;
mod types;

pub use default_observer::DefaultObserver;
pub use game_observer::TickObserver;
pub use pathfinding::{Bfs, Reachability};
pub use types::{Bounds, DIRECTIONS, Position};

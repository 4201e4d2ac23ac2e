pub mod response;
pub mod lenient;
pub mod analysis;
pub mod chart;
pub mod performance;
pub mod scan;
pub mod view;

pub use response::*;
pub use analysis::*;
pub use chart::*;
pub use performance::*;
pub use scan::*;
pub use view::*;

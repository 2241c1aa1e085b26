pub mod error_banner;
pub mod info_box;
pub mod line_graph;
pub mod map;
pub mod region_select;
pub mod table;

pub use error_banner::ErrorBanner;
pub use info_box::InfoBox;
pub use line_graph::LineGraph;
pub use map::StatsMap;
pub use region_select::RegionSelect;
pub use table::RegionTable;

pub mod events;
pub mod metadata;
pub mod pattern;
pub mod visualization;

pub use events::{MatchEvent, PassEvent, PassResult, SetPieceEvent, SetPieceKind};
pub use metadata::{Ground, MatchMetadata, Pitch, PlayerInfo, PlayerRole, TeamInfo};
pub use pattern::{Coordinate, ExportInsert, Pattern, PatternEvent, PatternExport, PatternSummary};
pub use visualization::{
    ChromaKeyOptions, MagnifierOptions, MeasurerOptions, PlayersOptions, TacticalLine,
    TacticalLinesOptions, TeamSizeLine, TeamSizeOptions, TimeWindow, TrailOptions, Visualization,
};

mod export;
mod layout;
mod reader;
mod seqlock;
mod text;
mod writer;

pub use export::StatsMapping;
pub use layout::{
    LAYOUT_VERSION, RECORD_STRIDE, STATS_FILE_NAME, STATS_MAGIC, StatsHeader, slot_offset,
    slot_region_offset, total_bytes,
};
pub use reader::{MAX_READ_RETRIES, StatsReader};
pub use seqlock::SeqlockSlot;
pub use text::render;
pub use writer::StatsWriter;

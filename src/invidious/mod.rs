// =============================================================================
// Invidious API連携モジュール
// =============================================================================
// 上流のInvidious互換APIから動画詳細・コメント・字幕・チャンネル・検索結果を
// 取得する。キャッシュ・リトライは行わない。
// =============================================================================

mod client;
pub mod errors;
pub mod types;
mod vtt;

pub use client::InvidiousClient;
pub use errors::UpstreamError;
pub use types::{
    ChannelDetails, Comment, CommentsResult, Published, SearchItem, SearchResult,
    TranscriptLine, TranscriptResult, VideoDetails,
};

// 並列実行機能
// セマフォで上限を設けたワーカープールによるチャンク処理とキャンセル制御

pub mod cancellation;
pub mod processor;
pub(crate) mod worker;

// 公開API
pub use cancellation::Deadline;
pub use processor::ChunkProcessor;

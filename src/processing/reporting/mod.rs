// 進捗報告・監視
//
// プロセッサー本体はこのトレイト越しにバッチの進行状況を通知する。

pub mod traits;
pub mod implementations;

// 公開API
pub use traits::*;
pub use implementations::{NoOpProgressReporter, TracingProgressReporter};

//! IdGenerator port - 相関 ID 生成の抽象化
//!
//! チャットイベントと HTTP リクエストに振る ID を生成します。
//! テスト容易性のために、trait として抽象化しています。
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）

use crate::domain::ids::{EventId, RequestId};
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は相関 ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（HTTP ハンドラとイベントループの両方から使う）
pub trait IdGenerator: Send + Sync {
    fn generate_event_id(&self) -> EventId;

    fn generate_request_id(&self) -> RequestId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// Clock の現在時刻を timestamp 部分に使います。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_event_id(&self) -> EventId {
        EventId::from(self.next_ulid())
    }

    fn generate_request_id(&self) -> RequestId {
        RequestId::from(self.next_ulid())
    }
}

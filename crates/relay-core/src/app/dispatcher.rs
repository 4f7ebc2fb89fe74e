//! CommandDispatcher - 検証済みの Interaction をコンピュート操作に振り分ける
//!
//! 署名検証を通ったリクエストだけがここに来ます。どの分岐も同じリクエスト内で完結します。

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::bounded;
use crate::domain::{Action, CommandReply, Interaction, InteractionResponse, RelayError};
use crate::ports::ComputeControl;

pub const UNKNOWN_ACTION_MESSAGE: &str = "不明な action です";

pub struct CommandDispatcher {
    compute: Arc<dyn ComputeControl>,
    instance_id: Option<String>,
    timeout: Duration,
}

impl CommandDispatcher {
    pub fn new(
        compute: Arc<dyn ComputeControl>,
        instance_id: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            compute,
            instance_id,
            timeout,
        }
    }

    pub async fn dispatch(&self, interaction: Interaction) -> Result<CommandReply, RelayError> {
        match interaction {
            Interaction::Handshake => Ok(CommandReply::json(InteractionResponse::pong())),
            Interaction::ActionCommand {
                action: Some(action),
                ..
            } => {
                let content = self.run(action).await?;
                Ok(CommandReply::json(InteractionResponse::message(content)))
            }
            Interaction::ActionCommand {
                action: None,
                requested,
            } => {
                info!(?requested, "unrecognized action");
                Ok(CommandReply::json(InteractionResponse::message(
                    UNKNOWN_ACTION_MESSAGE,
                )))
            }
            Interaction::Unsupported(kind) => {
                info!(%kind, "unsupported interaction type");
                Ok(CommandReply::text("ok"))
            }
        }
    }

    async fn run(&self, action: Action) -> Result<String, RelayError> {
        let instance = self.instance_id.as_deref().ok_or_else(|| {
            RelayError::Configuration("COMPUTE_INSTANCE_ID が未設定です".into())
        })?;
        info!(action = action.as_str(), instance, "compute action");

        match action {
            Action::Start => {
                bounded("compute.begin", self.timeout, self.compute.begin(instance)).await?;
                Ok("EC2 を起動しました".to_string())
            }
            Action::Stop => {
                bounded("compute.end", self.timeout, self.compute.end(instance)).await?;
                Ok("EC2 を停止しました".to_string())
            }
            Action::Status => {
                let state =
                    bounded("compute.describe", self.timeout, self.compute.describe(instance))
                        .await?;
                Ok(format!("現在の状態: {state}"))
            }
        }
    }
}

//! ファンアウト集約
//!
//! リクエストされたフィールドから必要な上流呼び出しだけを組み立て、
//! 全て同時に実行して結果をキーごとにまとめる。
//!
//! ## 失敗の分離
//! 1つの呼び出しが失敗しても他の呼び出しはキャンセルされない。
//! 失敗したキーにはエラー記述子 `{error, details}` が入り、
//! レスポンス全体は成功として返す。

use futures::future::{join_all, BoxFuture, FutureExt};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::invidious::{
    ChannelDetails, CommentsResult, InvidiousClient, SearchResult, TranscriptResult,
    UpstreamError, VideoDetails,
};

/// リクエスト検証エラー（呼び出し元に400として返す）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("An 'id', 'channel', or 'search' parameter is required.")]
    MissingIdentifier,

    #[error("No valid fields or parameters provided.")]
    NoDispatchableField,
}

/// 取得可能なフィールド
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Details,
    Comments,
    Transcript,
    Channel,
}

impl Field {
    /// フィールド名から変換（未知の名前はNone）
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "details" => Some(Field::Details),
            "comments" => Some(Field::Comments),
            "transcript" => Some(Field::Transcript),
            "channel" => Some(Field::Channel),
            _ => None,
        }
    }

    /// レスポンスのキー名
    pub fn key(self) -> &'static str {
        match self {
            Field::Details => "details",
            Field::Comments => "comments",
            Field::Transcript => "transcript",
            Field::Channel => "channel",
        }
    }
}

/// 検索結果のキー名（fieldsに関係なく、検索クエリがあれば必ず実行）
pub const SEARCH_RESULTS_KEY: &str = "search_results";

/// 集約リクエスト
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchRequest {
    pub video_id: Option<String>,
    pub channel_id: Option<String>,
    pub query: Option<String>,
    pub fields: BTreeSet<Field>,
}

impl FetchRequest {
    /// 生のパラメータから作成
    ///
    /// 空文字列の識別子は未指定として扱う。`fields`はカンマ区切りで、
    /// 前後の空白を除去し、空要素と未知の名前は無視する。
    pub fn from_params(
        video_id: Option<String>,
        channel_id: Option<String>,
        query: Option<String>,
        fields: Option<&str>,
    ) -> Self {
        Self {
            video_id: non_empty(video_id),
            channel_id: non_empty(channel_id),
            query: non_empty(query),
            fields: fields.map(parse_fields).unwrap_or_default(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// カンマ区切りのフィールド一覧をパース
pub fn parse_fields(raw: &str) -> BTreeSet<Field> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter_map(Field::parse)
        .collect()
}

/// 上流から取得した値
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FieldPayload {
    Details(VideoDetails),
    Comments(CommentsResult),
    Transcript(TranscriptResult),
    Channel(ChannelDetails),
    SearchResults(SearchResult),
}

/// 取得失敗時のエラー記述子
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDescriptor {
    pub error: String,
    pub details: String,
}

impl ErrorDescriptor {
    fn new(key: &str, cause: &UpstreamError) -> Self {
        Self {
            error: format!("Failed to fetch {}", key),
            details: cause.to_string(),
        }
    }
}

/// キーごとの結果（成功値 または エラー記述子）
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FieldOutcome {
    Value(FieldPayload),
    Failed(ErrorDescriptor),
}

impl FieldOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, FieldOutcome::Failed(_))
    }
}

/// 集約レスポンス（キー順は決定的）
pub type AggregatedResponse = BTreeMap<&'static str, FieldOutcome>;

type PendingCall<'a> = BoxFuture<'a, (&'static str, Result<FieldPayload, UpstreamError>)>;

/// ディスパッチすべき呼び出しを組み立てる（まだ実行しない）
fn plan_calls<'a>(client: &'a InvidiousClient, request: &'a FetchRequest) -> Vec<PendingCall<'a>> {
    let mut calls: Vec<PendingCall<'a>> = Vec::new();

    for field in &request.fields {
        match (field, &request.video_id, &request.channel_id) {
            (Field::Details, Some(video_id), _) => calls.push(
                async move {
                    let result = client.fetch_video_details(video_id).await;
                    (Field::Details.key(), result.map(FieldPayload::Details))
                }
                .boxed(),
            ),
            (Field::Comments, Some(video_id), _) => calls.push(
                async move {
                    let result = client.fetch_comments(video_id).await;
                    (Field::Comments.key(), result.map(FieldPayload::Comments))
                }
                .boxed(),
            ),
            (Field::Transcript, Some(video_id), _) => calls.push(
                async move {
                    let result = client.fetch_transcript(video_id).await;
                    (Field::Transcript.key(), result.map(FieldPayload::Transcript))
                }
                .boxed(),
            ),
            (Field::Channel, _, Some(channel_id)) => calls.push(
                async move {
                    let result = client.fetch_channel_details(channel_id).await;
                    (Field::Channel.key(), result.map(FieldPayload::Channel))
                }
                .boxed(),
            ),
            // 必要な識別子がないフィールドは呼び出さない
            _ => {}
        }
    }

    if let Some(query) = &request.query {
        calls.push(
            async move {
                let result = client.search(query).await;
                (SEARCH_RESULTS_KEY, result.map(FieldPayload::SearchResults))
            }
            .boxed(),
        );
    }

    calls
}

/// リクエストを集約実行
///
/// # Errors
/// 識別子が1つもない、またはディスパッチ可能な呼び出しがない場合
/// `ValidationError`を返す（上流呼び出しは行わない）。
/// 上流のエラーはキーごとのエラー記述子になり、ここでは返らない。
pub async fn aggregate(
    client: &InvidiousClient,
    request: &FetchRequest,
) -> Result<AggregatedResponse, ValidationError> {
    if request.video_id.is_none() && request.channel_id.is_none() && request.query.is_none() {
        return Err(ValidationError::MissingIdentifier);
    }

    let calls = plan_calls(client, request);
    if calls.is_empty() {
        return Err(ValidationError::NoDispatchableField);
    }

    log::info!("Dispatching {} upstream call(s)", calls.len());

    let outcomes = join_all(calls).await;

    let response: AggregatedResponse = outcomes
        .into_iter()
        .map(|(key, result)| {
            let outcome = match result {
                Ok(payload) => FieldOutcome::Value(payload),
                Err(e) => {
                    log::warn!("Failed to fetch {}: {}", key, e);
                    FieldOutcome::Failed(ErrorDescriptor::new(key, &e))
                }
            };
            (key, outcome)
        })
        .collect();

    Ok(response)
}

// =============================================================================
// 動画分析レポート
// =============================================================================
// 動画詳細・コメント・チャンネル・字幕から固定構成のテキストレポートを生成
//
// 取得順序:
// 1. 動画詳細とコメントを同時に取得
// 2. 動画詳細が失敗したらエラー文字列を返して終了（以降の呼び出しなし）
// 3. チャンネル詳細（失敗時は空で続行）
// 4. 字幕（失敗・なしの場合は既定文言）
// =============================================================================

use crate::invidious::{
    ChannelDetails, Comment, CommentsResult, InvidiousClient, TranscriptLine, TranscriptResult,
    VideoDetails,
};
use crate::util::{format_date, format_number, NOT_AVAILABLE};

/// レポートに載せる上位コメント数
const TOP_COMMENT_COUNT: usize = 3;

const TRANSCRIPT_FALLBACK: &str = "Transcript not available.";
const COMMENTS_FALLBACK: &str = "No comments available.";
const DESCRIPTION_FALLBACK: &str = "No description.";

/// レポート生成に使う取得済みデータ
#[derive(Debug, Clone, Default)]
pub struct ReportInput {
    pub details: VideoDetails,
    /// コメント取得に失敗した場合はNone
    pub comments: Option<CommentsResult>,
    pub channel: ChannelDetails,
    pub transcript: TranscriptResult,
}

/// 動画IDからレポートを生成
///
/// 戻り値は常に文字列。動画詳細の取得に失敗した場合のみ
/// エラー内容を含む文字列になる。
pub async fn generate_report(client: &InvidiousClient, video_id: &str) -> String {
    log::info!("Generating report for video: {}", video_id);

    let (details, comments) = tokio::join!(
        client.fetch_video_details(video_id),
        client.fetch_comments(video_id)
    );

    let details = match details {
        Ok(details) => details,
        Err(e) => {
            log::error!("Could not fetch video details for {}: {}", video_id, e);
            return format!(
                "Error: Could not fetch video details for ID {}. Reason: {}",
                video_id, e
            );
        }
    };

    let comments = comments
        .map_err(|e| log::warn!("Comments unavailable for {}: {}", video_id, e))
        .ok();

    let channel = match details.author_id() {
        Some(channel_id) => client
            .fetch_channel_details(channel_id)
            .await
            .unwrap_or_else(|e| {
                log::warn!("Channel details unavailable for {}: {}", channel_id, e);
                ChannelDetails::default()
            }),
        None => ChannelDetails::default(),
    };

    let transcript = client.fetch_transcript(video_id).await.unwrap_or_else(|e| {
        log::warn!("Transcript unavailable for {}: {}", video_id, e);
        TranscriptResult::Unavailable
    });

    render_report(&ReportInput {
        details,
        comments,
        channel,
        transcript,
    })
}

/// 取得済みデータからレポート本文を組み立てる
pub fn render_report(input: &ReportInput) -> String {
    let details = &input.details;

    let description = details
        .description()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(DESCRIPTION_FALLBACK);

    let mut opinion = String::new();
    if let Some(sentiment) = input.comments.as_ref().and_then(|c| c.sentiment()) {
        opinion.push_str(&format!(
            "The overall sentiment based on top comments seems to be: {}.\n",
            sentiment
        ));
    }
    opinion.push_str(&top_comments_block(input.comments.as_ref()));

    format!(
        "**YouTube Video Analysis Report**
**1. Basic Information:**
- Title: {title}
- Views: {views}
- Likes: {likes}
- Uploaded On: {uploaded}
**2. Channel Details:**
- Channel Name: {channel_name}
- Subscribers: {subscribers}
- Channel ID: {channel_id}
**3. Video Description:**
{description}
**4. Video Transcript (What is being said):**
{transcript}
**5. Public Opinion (Top Comments Summary):**
{opinion}
--- End of Report ---",
        title = details.title().unwrap_or(NOT_AVAILABLE),
        views = format_number(details.view_count()),
        likes = format_number(details.like_count()),
        uploaded = format_date(details.published().as_ref()),
        channel_name = details.author().unwrap_or(NOT_AVAILABLE),
        subscribers = format_number(input.channel.sub_count()),
        channel_id = details.author_id().unwrap_or(NOT_AVAILABLE),
        description = description,
        transcript = transcript_block(&input.transcript),
        opinion = opinion,
    )
}

/// 字幕を "(秒s) テキスト" 形式で連結
fn transcript_block(transcript: &TranscriptResult) -> String {
    match transcript {
        TranscriptResult::Available { lines } if !lines.is_empty() => lines
            .iter()
            .map(|TranscriptLine { start, text }| format!("({:.2}s) {}", start, text))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => TRANSCRIPT_FALLBACK.to_string(),
    }
}

/// いいね数の上位コメントを選ぶ（同数は元の順序を維持）
pub fn top_comments(comments: &[Comment]) -> Vec<&Comment> {
    let mut ranked: Vec<&Comment> = comments.iter().collect();
    // sort_byは安定ソート
    ranked.sort_by(|a, b| b.likes().cmp(&a.likes()));
    ranked.truncate(TOP_COMMENT_COUNT);
    ranked
}

fn top_comments_block(comments: Option<&CommentsResult>) -> String {
    let comments = comments.map(CommentsResult::comments).unwrap_or_default();
    if comments.is_empty() {
        return COMMENTS_FALLBACK.to_string();
    }

    top_comments(&comments)
        .into_iter()
        .map(|c| {
            format!(
                "- Top Comment ({} likes): {}",
                format_number(Some(c.likes())),
                c.content().unwrap_or_default().trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use super::{errors::UpstreamError, types::*, vtt};

/// Invidious APIクライアント
///
/// 全リクエストで1つの`reqwest::Client`（コネクションプール）を共有する。
/// リトライは行わず、各呼び出しは1回だけ試行する。
#[derive(Debug, Clone)]
pub struct InvidiousClient {
    client: Client,
    api_base: Url,
    timeout_secs: u64,
}

impl InvidiousClient {
    /// 新しいクライアントを作成
    ///
    /// # Arguments
    /// * `api_base` - 上流APIのベースURL（例: `https://inv.example/api/v1`）
    /// * `timeout` - 上流1リクエストあたりのタイムアウト
    ///
    /// # Errors
    /// ベースURLが不正、またはHTTPクライアントのビルドに失敗した場合
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let api_base = Url::parse(api_base.trim_end_matches('/'))
            .map_err(|e| UpstreamError::InvalidUrl(format!("{}: {}", api_base, e)))?;

        if api_base.cannot_be_a_base() {
            return Err(UpstreamError::InvalidUrl(api_base.to_string()));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_base,
            timeout_secs: timeout.as_secs(),
        })
    }

    /// 動画詳細を取得
    pub async fn fetch_video_details(&self, video_id: &str) -> Result<VideoDetails, UpstreamError> {
        log::debug!("Fetching video details for: {}", video_id);
        let url = self.endpoint(&["videos", video_id])?;
        self.get_json(url).await
    }

    /// コメントを取得（先頭ページのみ）
    pub async fn fetch_comments(&self, video_id: &str) -> Result<CommentsResult, UpstreamError> {
        log::debug!("Fetching comments for: {}", video_id);
        let url = self.endpoint(&["comments", video_id])?;
        self.get_json(url).await
    }

    /// 字幕を取得
    ///
    /// 1. `/videos/{id}?fields=captions` で字幕トラック一覧を取得
    /// 2. 先頭トラックのURLがなければ`Unavailable`（エラーではない）
    /// 3. 先頭トラックのURLをホストルート基準で解決して本文を取得
    ///
    /// 通信・HTTP・パースの失敗のみエラーとする
    pub async fn fetch_transcript(&self, video_id: &str) -> Result<TranscriptResult, UpstreamError> {
        log::debug!("Fetching captions list for: {}", video_id);

        let mut url = self.endpoint(&["videos", video_id])?;
        url.query_pairs_mut().append_pair("fields", "captions");
        let captions: Value = self.get_json(url).await?;

        let Some(track_url) = first_caption_url(&captions) else {
            log::info!("No captions available for: {}", video_id);
            return Ok(TranscriptResult::Unavailable);
        };

        let track_url = self.resolve_caption_url(track_url)?;
        log::debug!("Fetching caption track: {}", track_url);

        let body = self.get_text(track_url).await?;
        let lines = parse_caption_body(&body)?;

        Ok(TranscriptResult::from_lines(lines))
    }

    /// チャンネル詳細を取得
    pub async fn fetch_channel_details(
        &self,
        channel_id: &str,
    ) -> Result<ChannelDetails, UpstreamError> {
        log::debug!("Fetching channel details for: {}", channel_id);
        let url = self.endpoint(&["authors", channel_id])?;
        self.get_json(url).await
    }

    /// 動画を検索
    pub async fn search(&self, query: &str) -> Result<SearchResult, UpstreamError> {
        log::debug!("Searching videos: {}", query);
        let mut url = self.endpoint(&["search"])?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("type", "video");
        self.get_json(url).await
    }

    /// ベースURLにパスセグメントを追加（各セグメントはエンコードされる）
    fn endpoint(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        let mut url = self.api_base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| UpstreamError::InvalidUrl(self.api_base.to_string()))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    /// 字幕トラックのURLを解決
    ///
    /// 絶対URLはそのまま使う。相対パスはベースURLから`/api/v1`を除いた
    /// ホストルートに連結する。
    fn resolve_caption_url(&self, track_url: &str) -> Result<Url, UpstreamError> {
        if let Ok(absolute) = Url::parse(track_url) {
            return Ok(absolute);
        }

        let base = self.api_base.as_str().trim_end_matches('/');
        let root = base.strip_suffix("/api/v1").unwrap_or(base);
        let separator = if track_url.starts_with('/') { "" } else { "/" };

        Url::parse(&format!("{}{}{}", root, separator, track_url))
            .map_err(|e| UpstreamError::InvalidUrl(format!("{}: {}", track_url, e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, UpstreamError> {
        let body = self.get_text(url).await?;
        serde_json::from_str(&body).map_err(|e| UpstreamError::ParseError(e.to_string()))
    }

    async fn get_text(&self, url: Url) -> Result<String, UpstreamError> {
        let path = url.path().to_string();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("Invidious API error: {} {} - {}", path, status, body);
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.text().await.map_err(|e| self.map_transport_error(e))
    }

    fn map_transport_error(&self, e: reqwest::Error) -> UpstreamError {
        if e.is_timeout() {
            log::warn!("Invidious API request timed out after {}s", self.timeout_secs);
            UpstreamError::Timeout(self.timeout_secs)
        } else {
            log::error!("Invidious API request failed: {}", e);
            UpstreamError::HttpError(e)
        }
    }
}

/// 字幕本文をパース（WebVTT または `{lines: [...]}` 形式のJSON）
fn parse_caption_body(body: &str) -> Result<Vec<TranscriptLine>, UpstreamError> {
    if vtt::is_webvtt(body) {
        return Ok(vtt::parse_webvtt(body));
    }

    let document: CaptionDocument =
        serde_json::from_str(body).map_err(|e| UpstreamError::ParseError(e.to_string()))?;
    Ok(document.lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard) -> InvidiousClient {
        InvidiousClient::new(&format!("{}/api/v1", server.url()), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_invalid_base_url() {
        let result = InvidiousClient::new("not a url", Duration::from_secs(5));
        assert!(matches!(result, Err(UpstreamError::InvalidUrl(_))));
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client =
            InvidiousClient::new("https://inv.example/api/v1/", Duration::from_secs(5)).unwrap();
        let url = client.endpoint(&["videos", "a/b?c"]).unwrap();
        assert_eq!(url.as_str(), "https://inv.example/api/v1/videos/a%2Fb%3Fc");
    }

    #[test]
    fn test_resolve_caption_url() {
        let client =
            InvidiousClient::new("https://inv.example/api/v1", Duration::from_secs(5)).unwrap();

        assert_eq!(
            client
                .resolve_caption_url("/api/v1/captions/abc?label=English")
                .unwrap()
                .as_str(),
            "https://inv.example/api/v1/captions/abc?label=English"
        );
        assert_eq!(
            client
                .resolve_caption_url("https://cdn.example/track.vtt")
                .unwrap()
                .as_str(),
            "https://cdn.example/track.vtt"
        );
    }

    #[tokio::test]
    async fn test_fetch_video_details() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/videos/abc123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"videoId":"abc123","title":"Hello","viewCount":1234567,"authorId":"UC1"}"#)
            .create_async()
            .await;

        let details = client_for(&server).fetch_video_details("abc123").await.unwrap();

        assert_eq!(details.title(), Some("Hello"));
        assert_eq!(details.view_count(), Some(1234567));
        assert_eq!(details.author_id(), Some("UC1"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unexpected_field_types_are_not_parse_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/videos/abc")
            .with_status(200)
            .with_body(r#"{"videoId":"abc","title":12345,"viewCount":"lots","likeCount":1.9}"#)
            .create_async()
            .await;

        let details = client_for(&server).fetch_video_details("abc").await.unwrap();

        assert_eq!(details.title(), None);
        assert_eq!(details.view_count(), None);
        assert_eq!(details.as_value()["title"], serde_json::json!(12345));
        assert_eq!(details.as_value()["likeCount"], serde_json::json!(1.9));
    }

    #[tokio::test]
    async fn test_silent_upstream_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // 接続は受け付けるが応答しない
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client =
            InvidiousClient::new(&format!("http://{}/api/v1", addr), Duration::from_secs(1))
                .unwrap();
        let result = client.fetch_video_details("abc123").await;

        assert!(matches!(result, Err(UpstreamError::Timeout(1))), "got {:?}", result);
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/comments/abc123")
            .with_status(500)
            .with_body("upstream exploded")
            .create_async()
            .await;

        let result = client_for(&server).fetch_comments("abc123").await;

        match result {
            Err(UpstreamError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "upstream exploded");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/authors/UC1")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let result = client_for(&server).fetch_channel_details("UC1").await;
        assert!(matches!(result, Err(UpstreamError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_transcript_unavailable_without_captions() {
        let mut server = mockito::Server::new_async().await;
        let captions = server
            .mock("GET", "/api/v1/videos/abc123")
            .match_query(Matcher::UrlEncoded("fields".into(), "captions".into()))
            .with_status(200)
            .with_body(r#"{"captions":[]}"#)
            .create_async()
            .await;

        let result = client_for(&server).fetch_transcript("abc123").await.unwrap();

        assert_eq!(result, TranscriptResult::Unavailable);
        captions.assert_async().await;
    }

    #[tokio::test]
    async fn test_transcript_from_webvtt_track() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/videos/abc123")
            .match_query(Matcher::UrlEncoded("fields".into(), "captions".into()))
            .with_status(200)
            .with_body(
                r#"{"captions":[{"label":"English","languageCode":"en","url":"/api/v1/captions/abc123?label=English"}]}"#,
            )
            .create_async()
            .await;
        let track = server
            .mock("GET", "/api/v1/captions/abc123")
            .match_query(Matcher::UrlEncoded("label".into(), "English".into()))
            .with_status(200)
            .with_header("content-type", "text/vtt")
            .with_body("WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nhello there\n")
            .create_async()
            .await;

        let result = client_for(&server).fetch_transcript("abc123").await.unwrap();

        assert_eq!(
            result,
            TranscriptResult::Available {
                lines: vec![TranscriptLine {
                    start: 1.0,
                    text: "hello there".to_string()
                }]
            }
        );
        track.assert_async().await;
    }

    #[tokio::test]
    async fn test_transcript_from_json_track() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/videos/abc123")
            .match_query(Matcher::UrlEncoded("fields".into(), "captions".into()))
            .with_status(200)
            .with_body(r#"{"captions":[{"url":"/api/v1/captions/abc123"}]}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/v1/captions/abc123")
            .with_status(200)
            .with_body(r#"{"lines":[{"start":0.5,"text":"a"},{"start":2.0,"text":"b"}]}"#)
            .create_async()
            .await;

        let result = client_for(&server).fetch_transcript("abc123").await.unwrap();

        match result {
            TranscriptResult::Available { lines } => {
                assert_eq!(lines.len(), 2);
                assert_eq!(lines[1].text, "b");
            }
            TranscriptResult::Unavailable => panic!("expected transcript lines"),
        }
    }

    #[tokio::test]
    async fn test_transcript_track_failure_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/videos/abc123")
            .match_query(Matcher::UrlEncoded("fields".into(), "captions".into()))
            .with_status(200)
            .with_body(r#"{"captions":[{"url":"/api/v1/captions/abc123"}]}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/v1/captions/abc123")
            .with_status(404)
            .create_async()
            .await;

        let result = client_for(&server).fetch_transcript("abc123").await;
        assert!(matches!(result, Err(UpstreamError::Status { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_search_encodes_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "rust & tokio".into()),
                Matcher::UrlEncoded("type".into(), "video".into()),
            ]))
            .with_status(200)
            .with_body(r#"[{"type":"video","videoId":"v1","title":"Rust async","viewCount":10}]"#)
            .create_async()
            .await;

        let results = client_for(&server).search("rust & tokio").await.unwrap();

        let items = results.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].video_id(), Some("v1"));
        assert_eq!(items[0].view_count(), Some(10));
        assert_eq!(
            serde_json::to_value(&results).unwrap()[0]["type"],
            serde_json::json!("video")
        );
        mock.assert_async().await;
    }
}

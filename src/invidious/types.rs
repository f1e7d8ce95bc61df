use serde::{Deserialize, Serialize};
use serde_json::Value;

// 上流(Invidious)のレスポンス型
//
// 各型は上流のJSONドキュメントをそのまま保持し、/api/fetch はそれを
// 無変換で返す。レポートで使う値はアクセサで寛容に読み取り、
// 型が合わない値は欠損として扱う（パースエラーにはしない）。

/// 動画の公開日時（ISO-8601文字列 または UNIX秒）
#[derive(Debug, Clone, PartialEq)]
pub enum Published {
    Unix(i64),
    Text(String),
}

/// 数値・数値文字列を寛容に読み取る（それ以外はNone）
pub fn count_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn str_field<'a>(doc: &'a Value, key: &str) -> Option<&'a str> {
    doc.get(key).and_then(Value::as_str)
}

fn count_field(doc: &Value, key: &str) -> Option<i64> {
    doc.get(key).and_then(count_from_value)
}

fn published_field(doc: &Value) -> Option<Published> {
    match doc.get("published")? {
        Value::String(s) => Some(Published::Text(s.clone())),
        other => count_from_value(other).map(Published::Unix),
    }
}

/// 動画詳細 (`/videos/{id}`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoDetails(Value);

impl From<Value> for VideoDetails {
    fn from(doc: Value) -> Self {
        Self(doc)
    }
}

impl VideoDetails {
    /// 上流のドキュメント
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn video_id(&self) -> Option<&str> {
        str_field(&self.0, "videoId")
    }

    pub fn title(&self) -> Option<&str> {
        str_field(&self.0, "title")
    }

    pub fn description(&self) -> Option<&str> {
        str_field(&self.0, "description")
    }

    pub fn view_count(&self) -> Option<i64> {
        count_field(&self.0, "viewCount")
    }

    pub fn like_count(&self) -> Option<i64> {
        count_field(&self.0, "likeCount")
    }

    pub fn published(&self) -> Option<Published> {
        published_field(&self.0)
    }

    pub fn author(&self) -> Option<&str> {
        str_field(&self.0, "author")
    }

    pub fn author_id(&self) -> Option<&str> {
        str_field(&self.0, "authorId")
    }
}

/// コメント1件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Comment(Value);

impl From<Value> for Comment {
    fn from(doc: Value) -> Self {
        Self(doc)
    }
}

impl Comment {
    pub fn content(&self) -> Option<&str> {
        str_field(&self.0, "content")
    }

    /// いいね数（欠損時は0）
    pub fn likes(&self) -> i64 {
        count_field(&self.0, "likeCount").unwrap_or(0)
    }
}

/// コメント一覧 (`/comments/{id}`)
///
/// `continuation`などのページング情報もそのまま返す（追跡はしない）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentsResult(Value);

impl From<Value> for CommentsResult {
    fn from(doc: Value) -> Self {
        Self(doc)
    }
}

impl CommentsResult {
    /// `comments`配列（配列でなければ空）
    pub fn comments(&self) -> Vec<Comment> {
        self.0
            .get("comments")
            .and_then(Value::as_array)
            .map(|items| items.iter().cloned().map(Comment::from).collect())
            .unwrap_or_default()
    }

    pub fn sentiment(&self) -> Option<&str> {
        str_field(&self.0, "sentiment")
    }
}

/// チャンネル詳細 (`/authors/{id}`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelDetails(Value);

impl From<Value> for ChannelDetails {
    fn from(doc: Value) -> Self {
        Self(doc)
    }
}

impl ChannelDetails {
    pub fn author_id(&self) -> Option<&str> {
        str_field(&self.0, "authorId")
    }

    pub fn author(&self) -> Option<&str> {
        str_field(&self.0, "author")
    }

    pub fn sub_count(&self) -> Option<i64> {
        count_field(&self.0, "subCount")
    }
}

/// 検索結果 (`/search?type=video`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchResult(Value);

impl From<Value> for SearchResult {
    fn from(doc: Value) -> Self {
        Self(doc)
    }
}

impl SearchResult {
    /// 検索結果の各要素（配列でなければ空）
    pub fn items(&self) -> Vec<SearchItem> {
        self.0
            .as_array()
            .map(|items| items.iter().cloned().map(SearchItem).collect())
            .unwrap_or_default()
    }
}

/// 検索結果の1件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchItem(Value);

impl SearchItem {
    pub fn video_id(&self) -> Option<&str> {
        str_field(&self.0, "videoId")
    }

    pub fn title(&self) -> Option<&str> {
        str_field(&self.0, "title")
    }

    pub fn author(&self) -> Option<&str> {
        str_field(&self.0, "author")
    }

    pub fn view_count(&self) -> Option<i64> {
        count_field(&self.0, "viewCount")
    }

    pub fn published(&self) -> Option<Published> {
        published_field(&self.0)
    }
}

// 字幕

/// `/videos/{id}?fields=captions` のレスポンスから先頭トラックのURLを取り出す
///
/// `captions`が配列でない、空、またはURLが文字列でない場合はNone
pub fn first_caption_url(doc: &Value) -> Option<&str> {
    doc.get("captions")
        .and_then(Value::as_array)
        .and_then(|tracks| tracks.first())
        .and_then(|track| str_field(track, "url"))
}

/// JSON形式の字幕ファイル
#[derive(Debug, Deserialize)]
pub struct CaptionDocument {
    #[serde(default)]
    pub lines: Vec<TranscriptLine>,
}

/// 字幕の1行（startは秒）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptLine {
    pub start: f64,
    pub text: String,
}

/// 字幕取得結果
///
/// 字幕が存在しないことはエラーではなく`Unavailable`として表現する
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TranscriptResult {
    Available { lines: Vec<TranscriptLine> },
    #[default]
    Unavailable,
}

impl TranscriptResult {
    /// 行のリストから結果を作成（空なら`Unavailable`）
    pub fn from_lines(lines: Vec<TranscriptLine>) -> Self {
        if lines.is_empty() {
            TranscriptResult::Unavailable
        } else {
            TranscriptResult::Available { lines }
        }
    }
}

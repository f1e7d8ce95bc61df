//! WebVTT字幕のパーサー
//!
//! Invidiousの`/api/v1/captions/{id}`は`text/vtt`を返すため、
//! キューごとに開始秒とテキストを取り出して`TranscriptLine`に変換する。

use regex::Regex;
use std::sync::OnceLock;

use super::types::TranscriptLine;

// 正規表現のシングルトン（OnceLockで初回のみコンパイル）
static CUE_TIMING_RE: OnceLock<Regex> = OnceLock::new();
static TAG_RE: OnceLock<Regex> = OnceLock::new();

fn get_cue_timing_regex() -> &'static Regex {
    CUE_TIMING_RE.get_or_init(|| {
        Regex::new(r"^\s*(?:(\d+):)?(\d{1,2}):(\d{2})[.,](\d{3})\s+-->")
            .expect("Failed to compile cue timing regex")
    })
}

fn get_tag_regex() -> &'static Regex {
    TAG_RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("Failed to compile tag regex"))
}

/// WebVTT本文かどうか（BOM・先頭空白を許容）
pub fn is_webvtt(body: &str) -> bool {
    body.trim_start_matches('\u{feff}')
        .trim_start()
        .starts_with("WEBVTT")
}

/// WebVTT本文を字幕行のリストに変換
///
/// タイミング行を持たないブロック（ヘッダー、NOTE、STYLE）は無視する。
/// テキストが空になったキューも捨てる。
pub fn parse_webvtt(body: &str) -> Vec<TranscriptLine> {
    let normalized = body.replace("\r\n", "\n").replace('\r', "\n");

    normalized
        .split("\n\n")
        .filter_map(parse_cue_block)
        .collect()
}

fn parse_cue_block(block: &str) -> Option<TranscriptLine> {
    let mut lines = block.lines();

    // キュー識別子は省略可能なので、"-->"を含む行までスキップ
    let timing_line = lines.by_ref().find(|line| line.contains("-->"))?;
    let start = parse_cue_start(timing_line)?;

    let text = lines
        .map(clean_cue_text)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if text.is_empty() {
        return None;
    }

    Some(TranscriptLine { start, text })
}

/// "hh:mm:ss.mmm --> ..." の開始時刻を秒に変換
fn parse_cue_start(timing_line: &str) -> Option<f64> {
    let caps = get_cue_timing_regex().captures(timing_line)?;

    let hours: f64 = caps
        .get(1)
        .map(|m| m.as_str().parse().unwrap_or(0.0))
        .unwrap_or(0.0);
    let minutes: f64 = caps.get(2)?.as_str().parse().ok()?;
    let seconds: f64 = caps.get(3)?.as_str().parse().ok()?;
    let millis: f64 = caps.get(4)?.as_str().parse().ok()?;

    Some(hours * 3600.0 + minutes * 60.0 + seconds + millis / 1000.0)
}

/// インラインタグ（<c>, <00:00:01.000> 等）と基本的な実体参照を除去
fn clean_cue_text(line: &str) -> String {
    get_tag_regex()
        .replace_all(line, "")
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

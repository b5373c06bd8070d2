//! 音频格式 (MIME)

pub const WAV: &str = "audio/wav";
pub const MPEG: &str = "audio/mpeg";
pub const MP4_AAC: &str = "audio/mp4";
pub const OGG_VORBIS: &str = "audio/ogg; codecs=vorbis";
pub const OGG_OPUS: &str = "audio/ogg; codecs=opus";
pub const WEBM_OPUS: &str = "audio/webm; codecs=opus";
pub const FLAC: &str = "audio/flac";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// 文本类条目（TTS 文案）的 MIME
pub const TEXT: &str = "text/plain";

/// 归一化 MIME：小写、去空白、统一别名（audio/x-wav、audio/wave → audio/wav）
pub fn normalize(mime: &str) -> String {
    let lowered: String = mime
        .to_ascii_lowercase()
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("; ");

    let (essence, params) = match lowered.split_once("; ") {
        Some((essence, params)) => (essence.to_string(), Some(params.to_string())),
        None => (lowered, None),
    };

    let essence = match essence.as_str() {
        "audio/x-wav" | "audio/wave" | "audio/vnd.wave" => WAV.to_string(),
        "audio/mp3" | "audio/x-mp3" => MPEG.to_string(),
        "audio/x-m4a" | "audio/aac" => MP4_AAC.to_string(),
        "audio/x-flac" => FLAC.to_string(),
        _ => essence,
    };

    match params {
        Some(params) => format!("{}; {}", essence, params),
        None => essence,
    }
}

/// 两个 MIME 是否表示同一格式
///
/// 一方无 codecs 参数时只比较主类型
pub fn same_format(a: &str, b: &str) -> bool {
    let a = normalize(a);
    let b = normalize(b);
    if a == b {
        return true;
    }
    let essence = |m: &str| m.split(';').next().unwrap_or_default().trim().to_string();
    let has_params = |m: &str| m.contains(';');
    essence(&a) == essence(&b) && (!has_params(&a) || !has_params(&b))
}

/// 根据 URL 扩展名推断格式
pub fn guess_from_url(url: &str) -> Option<&'static str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let ext = path.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "wav" => Some(WAV),
        "mp3" => Some(MPEG),
        "m4a" | "mp4" | "aac" => Some(MP4_AAC),
        "ogg" | "oga" => Some(OGG_VORBIS),
        "opus" => Some(OGG_OPUS),
        "webm" => Some(WEBM_OPUS),
        "flac" => Some(FLAC),
        _ => None,
    }
}

/// symphonia probe 使用的扩展名提示
pub fn extension_hint(mime: &str) -> Option<&'static str> {
    let normalized = normalize(mime);
    let essence = normalized.split(';').next().unwrap_or_default();
    match essence {
        "audio/wav" => Some("wav"),
        "audio/mpeg" => Some("mp3"),
        "audio/mp4" => Some("m4a"),
        "audio/ogg" => Some("ogg"),
        "audio/webm" => Some("webm"),
        "audio/flac" => Some("flac"),
        _ => None,
    }
}

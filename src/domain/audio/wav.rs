//! 最小 WAV 容器
//!
//! 44 字节标准头 + 16 位 PCM，保证任何 WAV 解码器都能读取

use super::{AudioError, PcmAudio};

pub const WAV_HEADER_LEN: usize = 44;
const PCM_FORMAT: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

/// WAV 头信息
#[derive(Debug, Clone, PartialEq)]
pub struct WavInfo {
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub data_start: usize,
    pub data_size: usize,
    pub duration_ms: u64,
}

/// 将 PCM 编码为 16 位 WAV
pub fn encode_wav(pcm: &PcmAudio) -> Vec<u8> {
    let channels = pcm.channels.max(1);
    let byte_rate = pcm.sample_rate * channels as u32 * (BITS_PER_SAMPLE / 8) as u32;
    let block_align = channels * (BITS_PER_SAMPLE / 8);
    let data_size = pcm.samples.len() * 2;

    let mut wav = Vec::with_capacity(WAV_HEADER_LEN + data_size);

    // RIFF header
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&((36 + data_size) as u32).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&PCM_FORMAT.to_le_bytes());
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&pcm.sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&(data_size as u32).to_le_bytes());

    for sample in &pcm.samples {
        let value = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
        wav.extend_from_slice(&value.to_le_bytes());
    }

    wav
}

fn read_u16(data: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([data[pos], data[pos + 1]])
}

fn read_u32(data: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

/// 解析 WAV 头（逐 chunk 查找 fmt 与 data）
pub fn parse_wav_info(data: &[u8]) -> Result<WavInfo, AudioError> {
    if data.len() < WAV_HEADER_LEN {
        return Err(AudioError::InvalidWav("data too short".to_string()));
    }
    if &data[0..4] != b"RIFF" {
        return Err(AudioError::InvalidWav("missing RIFF header".to_string()));
    }
    if &data[8..12] != b"WAVE" {
        return Err(AudioError::InvalidWav("missing WAVE identifier".to_string()));
    }

    let mut pos = 12;
    let mut fmt: Option<(u16, u16, u32, u16)> = None;

    while pos + 8 <= data.len() {
        let chunk_id = &data[pos..pos + 4];
        let chunk_size = read_u32(data, pos + 4) as usize;
        let body = pos + 8;

        match chunk_id {
            b"fmt " => {
                if chunk_size < 16 || body + 16 > data.len() {
                    return Err(AudioError::InvalidWav("invalid fmt chunk".to_string()));
                }
                fmt = Some((
                    read_u16(data, body),
                    read_u16(data, body + 2),
                    read_u32(data, body + 4),
                    read_u16(data, body + 14),
                ));
            }
            b"data" => {
                let (audio_format, channels, sample_rate, bits_per_sample) = fmt
                    .ok_or_else(|| AudioError::InvalidWav("missing fmt chunk".to_string()))?;
                // 流式写出的 WAV 可能把 data 大小写成 0 或超长
                let data_size = chunk_size.min(data.len() - body);
                let bytes_per_frame = (bits_per_sample as usize / 8) * channels as usize;
                let duration_ms = if bytes_per_frame > 0 && sample_rate > 0 {
                    (data_size / bytes_per_frame) as u64 * 1000 / sample_rate as u64
                } else {
                    0
                };
                return Ok(WavInfo {
                    audio_format,
                    channels,
                    sample_rate,
                    bits_per_sample,
                    data_start: body,
                    data_size,
                    duration_ms,
                });
            }
            _ => {}
        }

        pos = body + chunk_size + (chunk_size % 2);
    }

    Err(AudioError::InvalidWav("missing data chunk".to_string()))
}

/// 解码 16 位 PCM WAV
pub fn decode_wav(data: &[u8]) -> Result<PcmAudio, AudioError> {
    let info = parse_wav_info(data)?;
    if info.audio_format != PCM_FORMAT || info.bits_per_sample != BITS_PER_SAMPLE {
        return Err(AudioError::UnsupportedEncoding(format!(
            "format={} bits={}",
            info.audio_format, info.bits_per_sample
        )));
    }

    let body = &data[info.data_start..info.data_start + info.data_size];
    // 截断的 data 块只保留完整帧
    let block_align = 2 * info.channels.max(1) as usize;
    let samples = body
        .chunks_exact(block_align)
        .flat_map(|frame| frame.chunks_exact(2))
        .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0)
        .collect();

    Ok(PcmAudio::new(samples, info.sample_rate, info.channels))
}

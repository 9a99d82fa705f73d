// FormatSelector - picks the variant to relay for a requested output kind
//
// VIDEO: muxed (audio+video) variant with the highest bitrate; if none is muxed,
//        the highest-bitrate video-only variant.
// AUDIO: highest audio bitrate among variants carrying audio, any container.
//        Missing bitrate hints rank lowest, so the first audio variant wins when
//        no hints are present. Audio-only beats muxed on equal bitrate.
//
// Ties keep extractor order (first wins), so selection is deterministic.

use std::cmp::Ordering;

use super::errors::DownloadError;
use super::models::{FormatVariant, OutputKind};

/// Sort key: (bitrate, secondary preference). Absent bitrate ranks below any real one.
type Rank = (f32, u8);

const NO_BITRATE: f32 = -1.0;

pub struct FormatSelector;

impl FormatSelector {
    /// Select the variant to stream for `kind`
    pub fn select(
        variants: &[FormatVariant],
        kind: OutputKind,
    ) -> Result<FormatVariant, DownloadError> {
        let picked = match kind {
            OutputKind::Video => Self::find_best_video(variants),
            OutputKind::Audio => Self::find_best_audio(variants),
        };

        picked.cloned().ok_or_else(|| {
            DownloadError::NoMatchingFormat(format!(
                "none of {} variants carries {}",
                variants.len(),
                kind
            ))
        })
    }

    fn find_best_video(variants: &[FormatVariant]) -> Option<&FormatVariant> {
        let muxed = Self::highest(
            variants.iter().filter(|f| f.has_video && f.has_audio),
            |f| (f.bitrate_hint.unwrap_or(NO_BITRATE), 0),
        );

        muxed.or_else(|| {
            Self::highest(variants.iter().filter(|f| f.has_video), |f| {
                (f.bitrate_hint.unwrap_or(NO_BITRATE), 0)
            })
        })
    }

    fn find_best_audio(variants: &[FormatVariant]) -> Option<&FormatVariant> {
        Self::highest(variants.iter().filter(|f| f.has_audio), |f| {
            let bitrate = f.audio_bitrate.or(f.bitrate_hint).unwrap_or(NO_BITRATE);
            (bitrate, u8::from(!f.has_video))
        })
    }

    /// First candidate with the strictly greatest rank
    fn highest<'a, I, K>(candidates: I, rank: K) -> Option<&'a FormatVariant>
    where
        I: Iterator<Item = &'a FormatVariant>,
        K: Fn(&FormatVariant) -> Rank,
    {
        let mut best: Option<(&'a FormatVariant, Rank)> = None;

        for candidate in candidates {
            let r = rank(candidate);
            let better = match &best {
                None => true,
                Some((_, current)) => {
                    r.0.total_cmp(&current.0).then(r.1.cmp(&current.1)) == Ordering::Greater
                }
            };
            if better {
                best = Some((candidate, r));
            }
        }

        best.map(|(f, _)| f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_format(
        id: &str,
        container: &str,
        has_audio: bool,
        has_video: bool,
        bitrate: Option<f32>,
    ) -> FormatVariant {
        FormatVariant {
            format_id: id.to_string(),
            container: container.to_string(),
            has_audio,
            has_video,
            bitrate_hint: bitrate,
            ..Default::default()
        }
    }

    #[test]
    fn video_prefers_highest_bitrate_muxed() {
        let formats = vec![
            make_format("18", "mp4", true, true, Some(500.0)),
            make_format("137", "mp4", false, true, Some(4000.0)),
            make_format("22", "mp4", true, true, Some(1200.0)),
        ];

        let best = FormatSelector::select(&formats, OutputKind::Video).unwrap();
        assert_eq!(best.format_id, "22");
    }

    #[test]
    fn video_falls_back_to_video_only() {
        let formats = vec![
            make_format("140", "m4a", true, false, Some(128.0)),
            make_format("136", "mp4", false, true, Some(1500.0)),
            make_format("137", "mp4", false, true, Some(4000.0)),
        ];

        let best = FormatSelector::select(&formats, OutputKind::Video).unwrap();
        assert_eq!(best.format_id, "137");
    }

    #[test]
    fn audio_ignores_container_and_takes_highest_bitrate() {
        let formats = vec![
            make_format("140", "m4a", true, false, Some(128.0)),
            make_format("251", "webm", true, false, Some(160.0)),
            make_format("137", "mp4", false, true, Some(4000.0)),
        ];

        let best = FormatSelector::select(&formats, OutputKind::Audio).unwrap();
        assert_eq!(best.format_id, "251");
    }

    #[test]
    fn audio_bitrate_beats_total_bitrate_of_muxed_variant() {
        let mut muxed = make_format("18", "mp4", true, true, Some(600.0));
        muxed.audio_bitrate = Some(96.0);
        let mut audio = make_format("251", "webm", true, false, Some(150.0));
        audio.audio_bitrate = Some(150.0);

        let best = FormatSelector::select(&[muxed, audio], OutputKind::Audio).unwrap();
        assert_eq!(best.format_id, "251");
    }

    #[test]
    fn audio_without_bitrate_hints_prefers_audio_only() {
        let formats = vec![
            make_format("137", "mp4", false, true, None),
            make_format("18", "mp4", true, true, None),
            make_format("140", "m4a", true, false, None),
        ];

        let best = FormatSelector::select(&formats, OutputKind::Audio).unwrap();
        assert_eq!(best.format_id, "140");
    }

    #[test]
    fn audio_without_hints_falls_back_to_any_audio_variant() {
        let formats = vec![
            make_format("137", "mp4", false, true, None),
            make_format("18", "mp4", true, true, None),
            make_format("22", "mp4", true, true, None),
        ];

        let best = FormatSelector::select(&formats, OutputKind::Audio).unwrap();
        assert_eq!(best.format_id, "18");
    }

    #[test]
    fn ties_keep_extractor_order() {
        let formats = vec![
            make_format("a", "mp4", true, true, Some(500.0)),
            make_format("b", "webm", true, true, Some(500.0)),
        ];

        let best = FormatSelector::select(&formats, OutputKind::Video).unwrap();
        assert_eq!(best.format_id, "a");
    }

    #[test]
    fn no_matching_variant_is_an_error() {
        let formats = vec![make_format("137", "mp4", false, true, Some(4000.0))];

        let err = FormatSelector::select(&formats, OutputKind::Audio).unwrap_err();
        assert!(matches!(err, DownloadError::NoMatchingFormat(_)));

        let err = FormatSelector::select(&[], OutputKind::Video).unwrap_err();
        assert!(matches!(err, DownloadError::NoMatchingFormat(_)));
    }
}

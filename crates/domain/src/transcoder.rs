use crate::printer::Codepage;

/// Converts logical text into bytes a printer understands
///
/// Implementations are stateless per call; the codepage selects the mapping.
#[cfg_attr(test, mockall::automock)]
pub trait Transcoder: Send + Sync {
    /// Encode `text` for a printer configured with `codepage`
    fn transcode(&self, codepage: Codepage, text: &str) -> Vec<u8>;

    /// Canonical string exercising the printable ranges, used by calibration prints
    fn calibration_characters(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcoder_is_object_safe() {
        let mut mock = MockTranscoder::new();
        mock.expect_transcode()
            .returning(|_, text| text.as_bytes().to_vec());
        mock.expect_calibration_characters()
            .returning(|| "ABC".to_string());

        let transcoder: Box<dyn Transcoder> = Box::new(mock);
        assert_eq!(transcoder.transcode(Codepage::DEFAULT, "hi"), b"hi".to_vec());
        assert_eq!(transcoder.calibration_characters(), "ABC");
    }
}

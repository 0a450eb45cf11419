/// A finished recording for one interview question.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioClip {
    bytes: Vec<u8>,
    mime_type: String,
}

impl AudioClip {
    #[must_use]
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Browser-style recording (`audio/webm`).
    #[must_use]
    pub fn webm(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "audio/webm")
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File name used for uploads, derived from the mime subtype.
    #[must_use]
    pub fn file_name(&self) -> String {
        let ext = self
            .mime_type
            .split('/')
            .nth(1)
            .and_then(|sub| sub.split(';').next())
            .filter(|sub| !sub.is_empty())
            .unwrap_or("bin");
        format!("answer.{ext}")
    }
}

impl std::fmt::Debug for AudioClip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioClip")
            .field("len", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_follows_mime_subtype() {
        assert_eq!(AudioClip::webm(vec![1, 2]).file_name(), "answer.webm");
        assert_eq!(AudioClip::new(vec![], "audio/ogg;codecs=opus").file_name(), "answer.ogg");
        assert_eq!(AudioClip::new(vec![], "garbage").file_name(), "answer.bin");
    }
}

use crate::error::{Error, ValidationError};
use crate::wire::Placements;
use bytes::Bytes;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// A file picked by the user. The content is reference counted, so handing it
/// to the transport does not copy it.
#[derive(Clone, PartialEq, Eq)]
pub struct Upload {
    file_name: String,
    bytes: Bytes,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Upload {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Everything the signing service needs for one sign action.
pub struct SignatureRequest {
    source: Upload,
    credential: Upload,
    passphrase: SecretString,
    user_id: String,
    placements: Placements,
}

impl SignatureRequest {
    pub fn builder() -> SignatureRequestBuilder {
        SignatureRequestBuilder::default()
    }

    pub fn source(&self) -> &Upload {
        &self.source
    }

    pub fn credential(&self) -> &Upload {
        &self.credential
    }

    pub(crate) fn passphrase(&self) -> &str {
        self.passphrase.expose_secret()
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn placements(&self) -> &Placements {
        &self.placements
    }

    /// Value of the `signatures` form field.
    pub fn signatures_json(&self) -> Result<String, Error> {
        self.placements.to_json()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.source.is_empty() {
            return Err(ValidationError::MissingSourceFile);
        }
        if self.credential.is_empty() {
            return Err(ValidationError::MissingCredential);
        }
        if self.passphrase.expose_secret().is_empty() {
            return Err(ValidationError::EmptyPassphrase);
        }
        if self.placements.is_empty() {
            return Err(ValidationError::NoPlacement);
        }
        if let Some(index) = self.placements.pages().iter().position(|page| *page == 0) {
            return Err(ValidationError::InvalidPlacement {
                index,
                reason: "pages are numbered from 1".to_owned(),
            });
        }
        if self.user_id.trim().is_empty() {
            return Err(ValidationError::MissingUserId);
        }
        Ok(())
    }

    /// Give the document back once the request is finished with. The
    /// credential and passphrase are dropped here.
    pub fn into_source(self) -> Upload {
        self.source
    }
}

impl fmt::Debug for SignatureRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureRequest")
            .field("source", &self.source)
            .field("credential", &self.credential)
            .field("passphrase", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("placements", &self.placements)
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct SignatureRequestBuilder {
    source: Option<Upload>,
    credential: Option<Upload>,
    passphrase: Option<SecretString>,
    user_id: Option<String>,
    placements: Option<Placements>,
}

impl SignatureRequestBuilder {
    pub fn source(mut self, source: Upload) -> Self {
        self.source = Some(source);
        self
    }

    pub fn credential(mut self, credential: Upload) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn passphrase(mut self, passphrase: SecretString) -> Self {
        self.passphrase = Some(passphrase);
        self
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn placements(mut self, placements: Placements) -> Self {
        self.placements = Some(placements);
        self
    }

    /// Check every input before anything is assembled. On failure the
    /// builder is handed back so the caller keeps the files it put in.
    pub fn build(self) -> Result<SignatureRequest, (ValidationError, Self)> {
        match self {
            SignatureRequestBuilder {
                source: Some(source),
                credential: Some(credential),
                passphrase: Some(passphrase),
                user_id: Some(user_id),
                placements: Some(placements),
            } => {
                let request = SignatureRequest {
                    source,
                    credential,
                    passphrase,
                    user_id,
                    placements,
                };
                match request.validate() {
                    Ok(()) => Ok(request),
                    Err(err) => Err((err, request.into())),
                }
            }
            incomplete => {
                let err = incomplete.first_missing();
                Err((err, incomplete))
            }
        }
    }

    /// The first input, in validation order, that is absent or empty.
    /// Only called when at least one input is absent.
    fn first_missing(&self) -> ValidationError {
        if !self.source.as_ref().map_or(false, |source| !source.is_empty()) {
            ValidationError::MissingSourceFile
        } else if !self
            .credential
            .as_ref()
            .map_or(false, |credential| !credential.is_empty())
        {
            ValidationError::MissingCredential
        } else if !self
            .passphrase
            .as_ref()
            .map_or(false, |passphrase| !passphrase.expose_secret().is_empty())
        {
            ValidationError::EmptyPassphrase
        } else if !self
            .placements
            .as_ref()
            .map_or(false, |placements| !placements.is_empty())
        {
            ValidationError::NoPlacement
        } else {
            ValidationError::MissingUserId
        }
    }

    /// Recover the document after a failed `build`.
    pub fn take_source(&mut self) -> Option<Upload> {
        self.source.take()
    }
}

impl From<SignatureRequest> for SignatureRequestBuilder {
    fn from(request: SignatureRequest) -> Self {
        SignatureRequestBuilder {
            source: Some(request.source),
            credential: Some(request.credential),
            passphrase: Some(request.passphrase),
            user_id: Some(request.user_id),
            placements: Some(request.placements),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{PercentPlacement, SignaturePlacement};

    fn placements() -> Placements {
        Placements::BottomLeft(vec![SignaturePlacement {
            page: 1,
            x: 0.375,
            y: 0.46,
            w: 0.25,
            h: 0.08,
        }])
    }

    fn complete() -> SignatureRequestBuilder {
        SignatureRequest::builder()
            .source(Upload::new("contract.pdf", b"%PDF-1.5".to_vec()))
            .credential(Upload::new("key.pem", b"-----BEGIN".to_vec()))
            .passphrase(SecretString::from("hunter2"))
            .user_id("student-42")
            .placements(placements())
    }

    #[test]
    fn builds_complete_request() {
        let request = complete().build().unwrap();
        assert_eq!(request.source().file_name(), "contract.pdf");
        assert_eq!(request.passphrase(), "hunter2");
        assert_eq!(
            request.signatures_json().unwrap(),
            r#"[{"page":1,"x":0.375,"y":0.46,"w":0.25,"h":0.08}]"#
        );
    }

    #[test]
    fn debug_output_hides_passphrase() {
        let request = complete().build().unwrap();
        let debug = format!("{:?}", request);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn each_missing_input_has_its_own_error() {
        let (err, _) = SignatureRequest::builder().build().unwrap_err();
        assert_eq!(err, ValidationError::MissingSourceFile);

        let (err, mut builder) = SignatureRequest::builder()
            .source(Upload::new("contract.pdf", b"%PDF".to_vec()))
            .passphrase(SecretString::from("pw"))
            .placements(placements())
            .user_id("u")
            .build()
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingCredential);
        assert_eq!(builder.take_source().unwrap().file_name(), "contract.pdf");

        let (err, _) = complete()
            .passphrase(SecretString::from(""))
            .build()
            .unwrap_err();
        assert_eq!(err, ValidationError::EmptyPassphrase);

        let (err, _) = complete()
            .placements(Placements::Percent(Vec::new()))
            .build()
            .unwrap_err();
        assert_eq!(err, ValidationError::NoPlacement);

        let (err, _) = complete().user_id("  ").build().unwrap_err();
        assert_eq!(err, ValidationError::MissingUserId);

        let (err, _) = complete()
            .credential(Upload::new("empty.pem", Vec::new()))
            .build()
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingCredential);
    }

    #[test]
    fn placement_on_page_zero_is_rejected_before_sending() {
        let percent = PercentPlacement {
            page: 0,
            x_percent: 0.1,
            y_percent: 0.1,
            width_percent: 0.25,
            height_percent: 0.08,
        };
        let (err, mut builder) = complete()
            .placements(Placements::Percent(vec![percent]))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidPlacement { index: 0, .. }
        ));
        assert_eq!(builder.take_source().unwrap().file_name(), "contract.pdf");

        let mut list = vec![SignaturePlacement {
            page: 1,
            x: 0.375,
            y: 0.46,
            w: 0.25,
            h: 0.08,
        }];
        list.push(SignaturePlacement { page: 0, ..list[0] });
        let (err, _) = complete()
            .placements(Placements::BottomLeft(list))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidPlacement { index: 1, .. }
        ));
    }

    #[test]
    fn empty_source_is_reported_before_missing_credential() {
        let (err, _) = SignatureRequest::builder()
            .source(Upload::new("contract.pdf", Vec::new()))
            .passphrase(SecretString::from("pw"))
            .placements(placements())
            .user_id("u")
            .build()
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingSourceFile);
    }
}

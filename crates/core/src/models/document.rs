use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{keys, ValidationError};

const MIB: u64 = 1024 * 1024;

/// Kind of document an owner can be asked for.
///
/// The catalogue is open: strings outside it are carried as [`DocumentType::Other`]
/// and have no size limit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DocumentType {
    // Pre-screening
    Consent,
    Cv,
    // Companies
    JobAd,
    // German training
    Gltep,
    B2ec,
    // Employer
    EmployersDeclaration,
    // School documents
    Hsd,
    Form137,
    CmiEnglish,
    Cghs,
    Cd,
    Tor,
    TorCtc,
    Rle,
    RleCtc,
    Cgc,
    Cmi,
    Form137Ctc,
    HsdCtc,
    // Professional documents
    PrcId,
    PrcIdCtc,
    Cgs,
    PrcBcRating,
    PrcBcPasser,
    Ce,
    // Personal documents
    PassportCtc,
    MarriageCertificate,
    NbiClearance,
    Picture,
    CvGerman,
    Afn,
    Poan,
    PoaRwr,
    AfRwr,
    CertificateEnglish,
    // Posts
    Thumbnail,
    PostAudioRecording,
    Other(String),
}

impl DocumentType {
    /// Every catalogued type, in catalogue order.
    pub const KNOWN: [DocumentType; 37] = [
        DocumentType::Consent,
        DocumentType::Cv,
        DocumentType::JobAd,
        DocumentType::Gltep,
        DocumentType::B2ec,
        DocumentType::EmployersDeclaration,
        DocumentType::Hsd,
        DocumentType::Form137,
        DocumentType::CmiEnglish,
        DocumentType::Cghs,
        DocumentType::Cd,
        DocumentType::Tor,
        DocumentType::TorCtc,
        DocumentType::Rle,
        DocumentType::RleCtc,
        DocumentType::Cgc,
        DocumentType::Cmi,
        DocumentType::Form137Ctc,
        DocumentType::HsdCtc,
        DocumentType::PrcId,
        DocumentType::PrcIdCtc,
        DocumentType::Cgs,
        DocumentType::PrcBcRating,
        DocumentType::PrcBcPasser,
        DocumentType::Ce,
        DocumentType::PassportCtc,
        DocumentType::MarriageCertificate,
        DocumentType::NbiClearance,
        DocumentType::Picture,
        DocumentType::CvGerman,
        DocumentType::Afn,
        DocumentType::Poan,
        DocumentType::PoaRwr,
        DocumentType::AfRwr,
        DocumentType::CertificateEnglish,
        DocumentType::Thumbnail,
        DocumentType::PostAudioRecording,
    ];

    /// The persisted name, used as the SK suffix.
    pub fn as_str(&self) -> &str {
        match self {
            DocumentType::Consent => "Consent",
            DocumentType::Cv => "CV",
            DocumentType::JobAd => "JobAd",
            DocumentType::Gltep => "GLTEP",
            DocumentType::B2ec => "B2EC",
            DocumentType::EmployersDeclaration => "EmpDecl",
            DocumentType::Hsd => "HSD",
            DocumentType::Form137 => "Form137",
            DocumentType::CmiEnglish => "CMIEnglish",
            DocumentType::Cghs => "CGHS",
            DocumentType::Cd => "CD",
            DocumentType::Tor => "TOR",
            DocumentType::TorCtc => "TORCTC",
            DocumentType::Rle => "RLE",
            DocumentType::RleCtc => "RLECTC",
            DocumentType::Cgc => "CGC",
            DocumentType::Cmi => "CMI",
            DocumentType::Form137Ctc => "Form137CTC",
            DocumentType::HsdCtc => "HSDCTC",
            DocumentType::PrcId => "PRCID",
            DocumentType::PrcIdCtc => "PRCIDCTC",
            DocumentType::Cgs => "CGS",
            DocumentType::PrcBcRating => "PRCBCRating",
            DocumentType::PrcBcPasser => "PRCBCPasser",
            DocumentType::Ce => "CE",
            DocumentType::PassportCtc => "PassportCTC",
            DocumentType::MarriageCertificate => "MarriageCert",
            DocumentType::NbiClearance => "NBIClearance",
            DocumentType::Picture => "Picture",
            DocumentType::CvGerman => "CVGerman",
            DocumentType::Afn => "AFN",
            DocumentType::Poan => "POAN",
            DocumentType::PoaRwr => "POARWR",
            DocumentType::AfRwr => "AFRWR",
            DocumentType::CertificateEnglish => "CertEnglish",
            DocumentType::Thumbnail => "Thumbnail",
            DocumentType::PostAudioRecording => "PostAudioRec",
            DocumentType::Other(name) => name,
        }
    }

    /// Maximum upload size in bytes, or `None` when no limit applies.
    ///
    /// School-leaving documents (`HSD`, `Form137`) and uncatalogued types are unbounded.
    pub fn max_size(&self) -> Option<u64> {
        match self {
            DocumentType::Thumbnail | DocumentType::Picture => Some(MIB),
            DocumentType::PostAudioRecording => Some(40 * MIB),
            DocumentType::Hsd | DocumentType::Form137 | DocumentType::Other(_) => None,
            _ => Some(5 * MIB),
        }
    }
}

impl From<&str> for DocumentType {
    fn from(s: &str) -> Self {
        DocumentType::KNOWN
            .into_iter()
            .find(|known| known.as_str() == s)
            .unwrap_or_else(|| DocumentType::Other(s.to_string()))
    }
}

impl From<String> for DocumentType {
    fn from(s: String) -> Self {
        DocumentType::from(s.as_str())
    }
}

impl From<DocumentType> for String {
    fn from(document_type: DocumentType) -> Self {
        document_type.as_str().to_string()
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review state of a document slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Requested,
    Approved,
    Rejected,
    UnderAnalysis,
    NotApplicable,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Requested => "REQUESTED",
            DocumentStatus::Approved => "APPROVED",
            DocumentStatus::Rejected => "REJECTED",
            DocumentStatus::UnderAnalysis => "UNDER_ANALYSIS",
            DocumentStatus::NotApplicable => "NOT_APPLICABLE",
        }
    }

    /// True for the states only an admin can assign.
    pub fn is_decision(&self) -> bool {
        matches!(
            self,
            DocumentStatus::Approved | DocumentStatus::Rejected | DocumentStatus::NotApplicable
        )
    }
}

impl FromStr for DocumentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REQUESTED" => Ok(DocumentStatus::Requested),
            "APPROVED" => Ok(DocumentStatus::Approved),
            "REJECTED" => Ok(DocumentStatus::Rejected),
            "UNDER_ANALYSIS" => Ok(DocumentStatus::UnderAnalysis),
            "NOT_APPLICABLE" => Ok(DocumentStatus::NotApplicable),
            other => Err(ValidationError::InvalidPropertyValue {
                property: "Status".to_string(),
                reason: format!("unknown document status {other}"),
            }),
        }
    }
}

/// Returns the file extension (with its leading dot) if it is on the upload whitelist.
pub fn document_extension(file_name: &str) -> Result<&'static str, ValidationError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();

    match extension {
        "pdf" => Ok(".pdf"),
        "doc" => Ok(".doc"),
        "docx" => Ok(".docx"),
        "png" => Ok(".png"),
        "mp3" => Ok(".mp3"),
        _ => Err(ValidationError::UnsupportedExtension(file_name.to_string())),
    }
}

/// Maps a whitelisted extension to the content type objects are stored with.
pub fn content_type_for(extension: &str) -> Result<&'static str, ValidationError> {
    match extension {
        ".pdf" => Ok("application/pdf"),
        ".doc" => Ok("application/msword"),
        ".docx" => Ok("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        ".png" => Ok("image/png"),
        ".mp3" => Ok("audio/mpeg"),
        other => Err(ValidationError::UnsupportedExtension(other.to_string())),
    }
}

/// One document slot of an Application or a Post.
///
/// A slot exists from the moment it is requested; `name`, `content_type`,
/// `size_bytes` and `uploaded_at` are only filled in by [`Document::record_upload`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(rename = "id")]
    pub pk: String,
    #[serde(rename = "documentType")]
    pub sk: String,
    pub name: Option<String>,
    pub content_type: Option<String>,
    pub size_bytes: Option<u64>,
    pub requested_at: DateTime<Utc>,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub status: DocumentStatus,
    #[serde(default)]
    pub notes: String,
}

impl Document {
    /// Creates a requested slot for `document_type` under `owner_pk`.
    pub fn requested(
        owner_pk: impl Into<String>,
        document_type: &DocumentType,
        notes: impl Into<String>,
    ) -> Self {
        Self::requested_at(owner_pk, document_type, notes, Utc::now())
    }

    pub fn requested_at(
        owner_pk: impl Into<String>,
        document_type: &DocumentType,
        notes: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            pk: owner_pk.into(),
            sk: keys::document_sk(document_type.as_str()),
            name: None,
            content_type: None,
            size_bytes: None,
            requested_at: at,
            uploaded_at: None,
            status: DocumentStatus::Requested,
            notes: notes.into(),
        }
    }

    /// Fills in the upload attributes and moves the slot to `UnderAnalysis`.
    ///
    /// Fails on a non-whitelisted extension; the size limit is checked by [`Document::validate`].
    pub fn record_upload(&mut self, file_name: &str, size_bytes: u64) -> Result<(), ValidationError> {
        self.record_upload_at(file_name, size_bytes, Utc::now())
    }

    pub fn record_upload_at(
        &mut self,
        file_name: &str,
        size_bytes: u64,
        at: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        let extension = document_extension(file_name)?;
        let content_type = content_type_for(extension)?;

        self.content_type = Some(content_type.to_string());
        self.size_bytes = Some(size_bytes);
        self.uploaded_at = Some(at);
        self.status = DocumentStatus::UnderAnalysis;
        self.name = Some(keys::document_object_key(&self.pk, &self.sk, extension));
        Ok(())
    }

    /// The type encoded in the SK suffix.
    pub fn document_type(&self) -> Result<DocumentType, ValidationError> {
        self.sk
            .strip_prefix(&keys::child_sk_prefix(keys::DOCUMENT_PREFIX))
            .map(DocumentType::from)
            .ok_or_else(|| ValidationError::InvalidDocumentPrefix(self.sk.clone()))
    }

    /// True once content has been uploaded for this slot.
    pub fn is_uploaded(&self) -> bool {
        self.uploaded_at.is_some() && self.name.is_some()
    }

    /// Validates a slot that has only been requested.
    pub fn validate_request(&self) -> Result<(), ValidationError> {
        if self.pk.is_empty() {
            return Err(ValidationError::MissingField("PK"));
        }
        if self.sk.is_empty() {
            return Err(ValidationError::MissingField("SK"));
        }
        self.document_type()?;
        Ok(())
    }

    /// Validates an uploaded document: every field present, size within the type's limit.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_request()?;
        if self.name.as_deref().unwrap_or_default().is_empty() {
            return Err(ValidationError::MissingField("Name"));
        }
        if self.content_type.as_deref().unwrap_or_default().is_empty() {
            return Err(ValidationError::MissingField("ContentType"));
        }
        let size = self
            .size_bytes
            .ok_or(ValidationError::MissingField("SizeBytes"))?;
        if self.uploaded_at.is_none() {
            return Err(ValidationError::MissingField("uploadedAt"));
        }

        let document_type = self.document_type()?;
        if let Some(max) = document_type.max_size() {
            if size > max {
                return Err(ValidationError::SizeExceeded {
                    document_type: document_type.to_string(),
                    size,
                    max,
                });
            }
        }
        Ok(())
    }
}

/// Counts how many of `documents` are of a mandatory type, requiring all of them.
///
/// Types are counted once each, so two CVs do not stand in for a missing Consent.
pub(crate) fn check_mandatory_documents(
    mandatory: &[DocumentType],
    documents: &[Document],
) -> Result<(), ValidationError> {
    let mut found: Vec<DocumentType> = Vec::with_capacity(mandatory.len());
    for document in documents {
        let document_type = document.document_type()?;
        if mandatory.contains(&document_type) && !found.contains(&document_type) {
            found.push(document_type);
        }
    }

    if found.len() != mandatory.len() {
        return Err(ValidationError::MandatoryDocuments {
            expected: mandatory.len(),
            found: found.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uploaded(document_type: DocumentType, size: u64) -> Document {
        let mut document = Document::requested("APP#1", &document_type, "");
        document.record_upload("file.pdf", size).unwrap();
        document
    }

    #[test]
    fn test_document_type_round_trips_through_str() {
        for known in DocumentType::KNOWN {
            assert_eq!(DocumentType::from(known.as_str()), known);
        }
        assert_eq!(
            DocumentType::from("Diploma"),
            DocumentType::Other("Diploma".to_string())
        );
    }

    #[test]
    fn test_max_size_table() {
        assert_eq!(DocumentType::Cv.max_size(), Some(5 * MIB));
        assert_eq!(DocumentType::Thumbnail.max_size(), Some(MIB));
        assert_eq!(DocumentType::Picture.max_size(), Some(MIB));
        assert_eq!(DocumentType::PostAudioRecording.max_size(), Some(40 * MIB));
        assert_eq!(DocumentType::Hsd.max_size(), None);
        assert_eq!(DocumentType::Form137.max_size(), None);
        assert_eq!(DocumentType::from("Diploma").max_size(), None);
    }

    #[test]
    fn test_extension_whitelist() {
        assert_eq!(document_extension("cv.pdf"), Ok(".pdf"));
        assert_eq!(document_extension("letter.docx"), Ok(".docx"));
        assert_eq!(document_extension("audio.mp3"), Ok(".mp3"));
        assert_eq!(
            document_extension("photo.jpg"),
            Err(ValidationError::UnsupportedExtension("photo.jpg".to_string()))
        );
        assert!(document_extension("no_extension").is_err());
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for(".pdf"), Ok("application/pdf"));
        assert_eq!(content_type_for(".doc"), Ok("application/msword"));
        assert_eq!(content_type_for(".png"), Ok("image/png"));
        assert_eq!(content_type_for(".mp3"), Ok("audio/mpeg"));
        assert!(content_type_for(".gif").is_err());
    }

    #[test]
    fn test_requested_slot() {
        let document = Document::requested("APP#1", &DocumentType::Cv, "please send");

        assert_eq!(document.sk, "Document-CV");
        assert_eq!(document.status, DocumentStatus::Requested);
        assert!(!document.is_uploaded());
        assert!(document.validate_request().is_ok());
        assert_eq!(document.validate(), Err(ValidationError::MissingField("Name")));
    }

    #[test]
    fn test_record_upload() {
        let mut document = Document::requested("APP#1", &DocumentType::Cv, "");
        document.record_upload("my cv.docx", 1024).unwrap();

        assert_eq!(document.name.as_deref(), Some("APP#1-Document-CV.docx"));
        assert_eq!(
            document.content_type.as_deref(),
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        );
        assert_eq!(document.status, DocumentStatus::UnderAnalysis);
        assert!(document.is_uploaded());
    }

    #[test]
    fn test_record_upload_rejects_extension() {
        let mut document = Document::requested("APP#1", &DocumentType::Cv, "");
        let result = document.record_upload("cv.exe", 10);

        assert!(matches!(result, Err(ValidationError::UnsupportedExtension(_))));
        assert_eq!(document.status, DocumentStatus::Requested);
    }

    #[test]
    fn test_size_at_maximum_passes() {
        assert!(uploaded(DocumentType::Thumbnail, MIB).validate().is_ok());
        assert!(uploaded(DocumentType::Cv, 5 * MIB).validate().is_ok());
    }

    #[test]
    fn test_size_over_maximum_fails() {
        let result = uploaded(DocumentType::Thumbnail, MIB + 1).validate();

        assert_eq!(
            result,
            Err(ValidationError::SizeExceeded {
                document_type: "Thumbnail".to_string(),
                size: MIB + 1,
                max: MIB,
            })
        );
    }

    #[test]
    fn test_unbounded_types_accept_any_size() {
        assert!(uploaded(DocumentType::Hsd, 500 * MIB).validate().is_ok());
    }

    #[test]
    fn test_document_type_requires_prefix() {
        let mut document = Document::requested("APP#1", &DocumentType::Cv, "");
        document.sk = "Message-CV".to_string();

        assert_eq!(
            document.document_type(),
            Err(ValidationError::InvalidDocumentPrefix("Message-CV".to_string()))
        );
    }

    #[test]
    fn test_mandatory_documents_counted_once_per_type() {
        let mandatory = [DocumentType::Cv, DocumentType::Consent];
        let cv = Document::requested("APP#1", &DocumentType::Cv, "");
        let consent = Document::requested("APP#1", &DocumentType::Consent, "");
        let job_ad = Document::requested("APP#1", &DocumentType::JobAd, "");

        assert!(check_mandatory_documents(&mandatory, &[cv.clone(), job_ad, consent]).is_ok());
        assert_eq!(
            check_mandatory_documents(&mandatory, &[cv.clone(), cv]),
            Err(ValidationError::MandatoryDocuments {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            "UNDER_ANALYSIS".parse::<DocumentStatus>(),
            Ok(DocumentStatus::UnderAnalysis)
        );
        assert!("DONE".parse::<DocumentStatus>().is_err());
        assert!(DocumentStatus::Approved.is_decision());
        assert!(!DocumentStatus::Requested.is_decision());
    }
}

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::document::check_mandatory_documents;
use super::error::{first_failure, not_blank, FieldCheck};
use super::{keys, Document, DocumentType, ValidationError};
use crate::store::{AttributeValue, PropertyType};

/// Outcome of the pre-screening interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PreScreeningStatus {
    #[default]
    Pq,
    Pa,
    Pfa,
    Dgkp,
    Nq,
}

impl PreScreeningStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreScreeningStatus::Pq => "PQ",
            PreScreeningStatus::Pa => "PA",
            PreScreeningStatus::Pfa => "PFA",
            PreScreeningStatus::Dgkp => "DGKP",
            PreScreeningStatus::Nq => "NQ",
        }
    }
}

impl FromStr for PreScreeningStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PQ" => Ok(PreScreeningStatus::Pq),
            "PA" => Ok(PreScreeningStatus::Pa),
            "PFA" => Ok(PreScreeningStatus::Pfa),
            "DGKP" => Ok(PreScreeningStatus::Dgkp),
            "NQ" => Ok(PreScreeningStatus::Nq),
            other => Err(ValidationError::InvalidPropertyValue {
                property: "PreScreeningStatus".to_string(),
                reason: format!("unknown status {other}"),
            }),
        }
    }
}

impl fmt::Display for PreScreeningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GermanTrainingInfo {
    pub exam_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accommodation {
    pub location: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerInfo {
    pub name: String,
    pub accommodation: Accommodation,
}

impl GermanTrainingInfo {
    pub fn to_attribute(&self) -> AttributeValue {
        AttributeValue::M(HashMap::from([(
            "ExamDate".to_string(),
            AttributeValue::S(self.exam_date.clone()),
        )]))
    }
}

impl EmployerInfo {
    pub fn to_attribute(&self) -> AttributeValue {
        let accommodation = HashMap::from([
            (
                "Location".to_string(),
                AttributeValue::S(self.accommodation.location.clone()),
            ),
            (
                "From".to_string(),
                AttributeValue::S(self.accommodation.from.clone()),
            ),
            (
                "To".to_string(),
                AttributeValue::S(self.accommodation.to.clone()),
            ),
        ]);
        AttributeValue::M(HashMap::from([
            ("Name".to_string(), AttributeValue::S(self.name.clone())),
            (
                "Accommodation".to_string(),
                AttributeValue::M(accommodation),
            ),
        ]))
    }
}

/// A submitted job application, the root of its documents and messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(rename = "id")]
    pub pk: String,
    #[serde(skip)]
    pub sk: String,
    #[serde(skip)]
    pub gsi_pk: String,
    pub created_at: DateTime<Utc>,
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(length(min = 1), email)]
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub analysed: bool,
    pub pre_screening_status: PreScreeningStatus,
    #[serde(skip)]
    pub cognito_id: String,
    pub german_training_info: Option<GermanTrainingInfo>,
    pub employer_info: Option<EmployerInfo>,
}

impl Application {
    /// Creates a new application with fresh keys and default attributes.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        let mut app = Self {
            pk: String::new(),
            sk: String::new(),
            gsi_pk: String::new(),
            created_at: Utc::now(),
            name: name.into(),
            email: email.into(),
            message: None,
            analysed: false,
            pre_screening_status: PreScreeningStatus::Pq,
            cognito_id: String::new(),
            german_training_info: None,
            employer_info: None,
        };
        app.generate_keys();
        app.generate_attributes();
        app
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Assigns a new `APP#<uuid>` identity and resets the external identity to unlinked.
    pub fn generate_keys(&mut self) {
        self.pk = keys::application_pk(Uuid::new_v4());
        self.sk = self.pk.clone();
        self.gsi_pk = keys::application_gsi_pk();
        self.cognito_id = keys::UNLINKED_IDENTITY.to_string();
    }

    /// Sets the defaults of a fresh application, stamped with the current time.
    pub fn generate_attributes(&mut self) {
        self.generate_attributes_at(Utc::now());
    }

    pub fn generate_attributes_at(&mut self, at: DateTime<Utc>) {
        self.analysed = false;
        self.pre_screening_status = PreScreeningStatus::Pq;
        self.created_at = at;
    }

    /// Bare id, without the `APP#` prefix.
    pub fn id(&self) -> &str {
        keys::application_id(&self.pk)
    }

    pub fn is_linked(&self) -> bool {
        self.cognito_id != keys::UNLINKED_IDENTITY
    }

    /// Documents every application must be submitted with.
    pub fn mandatory_documents() -> [DocumentType; 2] {
        [DocumentType::Cv, DocumentType::Consent]
    }

    /// Name, email and message, the data a notification needs.
    pub fn email_data(&self) -> (&str, &str, &str) {
        (
            &self.name,
            &self.email,
            self.message.as_deref().unwrap_or_default(),
        )
    }

    /// Checks required fields, the email format and the submitted mandatory documents.
    pub fn validate(&self, documents: &[Document]) -> Result<(), ValidationError> {
        if let Err(errors) = Validate::validate(self) {
            return Err(
                match first_failure(&errors, &[("name", "Name"), ("email", "Email")]) {
                    Some(("Email", FieldCheck::Email)) => {
                        ValidationError::InvalidEmail(self.email.clone())
                    }
                    Some((attribute, _)) => ValidationError::MissingField(attribute),
                    None => ValidationError::InvalidFields(errors.to_string()),
                },
            );
        }
        check_mandatory_documents(&Self::mandatory_documents(), documents)
    }
}

/// An admin-updatable application property, with its new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationProperty {
    Analysed(bool),
    PreScreeningStatus(PreScreeningStatus),
    GermanTrainingInfo(GermanTrainingInfo),
    EmployerInfo(EmployerInfo),
    /// Links the application to an external user identity.
    CognitoId(String),
}

impl ApplicationProperty {
    /// Parses a property by its public name (`analysed`, `pre-screening`,
    /// `german-training-info`, `employer-info`) and a JSON value.
    pub fn parse(property: &str, value: serde_json::Value) -> Result<Self, ValidationError> {
        let invalid = |e: serde_json::Error| ValidationError::InvalidPropertyValue {
            property: property.to_string(),
            reason: e.to_string(),
        };

        match property {
            "analysed" => serde_json::from_value(value)
                .map(ApplicationProperty::Analysed)
                .map_err(invalid),
            "pre-screening" => {
                let status: String = serde_json::from_value(value).map_err(invalid)?;
                status.parse().map(ApplicationProperty::PreScreeningStatus)
            }
            "german-training-info" => serde_json::from_value(value)
                .map(ApplicationProperty::GermanTrainingInfo)
                .map_err(invalid),
            "employer-info" => serde_json::from_value(value)
                .map(ApplicationProperty::EmployerInfo)
                .map_err(invalid),
            other => Err(ValidationError::UnknownProperty(other.to_string())),
        }
    }

    /// Persisted attribute name.
    pub fn attribute(&self) -> &'static str {
        match self {
            ApplicationProperty::Analysed(_) => "Analysed",
            ApplicationProperty::PreScreeningStatus(_) => "PreScreeningStatus",
            ApplicationProperty::GermanTrainingInfo(_) => "GermanTrainingInfo",
            ApplicationProperty::EmployerInfo(_) => "EmployerInfo",
            ApplicationProperty::CognitoId(_) => keys::ATTR_COGNITO_ID,
        }
    }

    pub fn property_type(&self) -> PropertyType {
        match self {
            ApplicationProperty::Analysed(_) => PropertyType::Bool,
            ApplicationProperty::PreScreeningStatus(_) | ApplicationProperty::CognitoId(_) => {
                PropertyType::String
            }
            ApplicationProperty::GermanTrainingInfo(_) | ApplicationProperty::EmployerInfo(_) => {
                PropertyType::Map
            }
        }
    }

    pub fn value(&self) -> AttributeValue {
        match self {
            ApplicationProperty::Analysed(analysed) => AttributeValue::Bool(*analysed),
            ApplicationProperty::PreScreeningStatus(status) => {
                AttributeValue::S(status.as_str().to_string())
            }
            ApplicationProperty::GermanTrainingInfo(info) => info.to_attribute(),
            ApplicationProperty::EmployerInfo(info) => info.to_attribute(),
            ApplicationProperty::CognitoId(identity) => AttributeValue::S(identity.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mandatory_documents(pk: &str) -> Vec<Document> {
        vec![
            Document::requested(pk, &DocumentType::Cv, ""),
            Document::requested(pk, &DocumentType::Consent, ""),
        ]
    }

    #[test]
    fn test_new_application_has_keys_and_defaults() {
        let app = Application::new("Ana", "ana@example.com");

        assert!(app.pk.starts_with("APP#"));
        assert_eq!(app.sk, app.pk);
        assert_eq!(app.gsi_pk, "APP");
        assert_eq!(app.cognito_id, "NA");
        assert!(!app.is_linked());
        assert!(!app.analysed);
        assert_eq!(app.pre_screening_status, PreScreeningStatus::Pq);
        assert!(Uuid::parse_str(app.id()).is_ok());
    }

    #[test]
    fn test_generate_keys_is_unique() {
        let first = Application::new("Ana", "ana@example.com");
        let second = Application::new("Ana", "ana@example.com");

        assert_ne!(first.pk, second.pk);
    }

    #[test]
    fn test_validate_with_mandatory_documents() {
        let app = Application::new("Ana", "ana@example.com");

        assert!(app.validate(&mandatory_documents(&app.pk)).is_ok());
    }

    #[test]
    fn test_validate_missing_consent() {
        let app = Application::new("Ana", "ana@example.com");
        let documents = vec![Document::requested(&app.pk, &DocumentType::Cv, "")];

        assert_eq!(
            app.validate(&documents),
            Err(ValidationError::MandatoryDocuments {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_validate_email() {
        let app = Application::new("Ana", "not-an-email");

        assert_eq!(
            app.validate(&mandatory_documents(&app.pk)),
            Err(ValidationError::InvalidEmail("not-an-email".to_string()))
        );
    }

    #[test]
    fn test_validate_name_required() {
        let app = Application::new("  ", "ana@example.com");

        assert_eq!(
            app.validate(&mandatory_documents(&app.pk)),
            Err(ValidationError::MissingField("Name"))
        );
    }

    #[test]
    fn test_validate_email_formats() {
        let valid = ["a@x.com", "first.last@sub.example.org"];
        let invalid = ["@x.com", "a b@x.com", "a@@x.com", "a@.com"];

        for email in valid {
            let app = Application::new("Ana", email);
            assert!(app.validate(&mandatory_documents(&app.pk)).is_ok(), "{email}");
        }
        for email in invalid {
            let app = Application::new("Ana", email);
            assert_eq!(
                app.validate(&mandatory_documents(&app.pk)),
                Err(ValidationError::InvalidEmail(email.to_string()))
            );
        }
    }

    #[test]
    fn test_validate_email_required() {
        let app = Application::new("Ana", "");

        assert_eq!(
            app.validate(&mandatory_documents(&app.pk)),
            Err(ValidationError::MissingField("Email"))
        );
    }

    #[test]
    fn test_email_data() {
        let app = Application::new("Ana", "ana@example.com").with_message("Hello");

        assert_eq!(app.email_data(), ("Ana", "ana@example.com", "Hello"));
    }

    #[test]
    fn test_parse_properties() {
        assert_eq!(
            ApplicationProperty::parse("analysed", json!(true)),
            Ok(ApplicationProperty::Analysed(true))
        );
        assert_eq!(
            ApplicationProperty::parse("pre-screening", json!("DGKP")),
            Ok(ApplicationProperty::PreScreeningStatus(
                PreScreeningStatus::Dgkp
            ))
        );

        let employer = ApplicationProperty::parse(
            "employer-info",
            json!({
                "name": "Klinikum",
                "accommodation": {"location": "Wien", "from": "2024-01-01", "to": "2024-06-30"}
            }),
        )
        .unwrap();
        assert_eq!(employer.attribute(), "EmployerInfo");
        assert_eq!(employer.property_type(), PropertyType::Map);
    }

    #[test]
    fn test_parse_property_errors() {
        assert_eq!(
            ApplicationProperty::parse("salary", json!(1)),
            Err(ValidationError::UnknownProperty("salary".to_string()))
        );
        assert!(matches!(
            ApplicationProperty::parse("analysed", json!("yes")),
            Err(ValidationError::InvalidPropertyValue { .. })
        ));
        assert!(ApplicationProperty::parse("pre-screening", json!("XX")).is_err());
    }

    #[test]
    fn test_property_value_matches_type() {
        let properties = [
            ApplicationProperty::Analysed(true),
            ApplicationProperty::PreScreeningStatus(PreScreeningStatus::Pa),
            ApplicationProperty::GermanTrainingInfo(GermanTrainingInfo {
                exam_date: "2024-05-01".to_string(),
            }),
            ApplicationProperty::EmployerInfo(EmployerInfo::default()),
            ApplicationProperty::CognitoId("sub-123".to_string()),
        ];

        for property in properties {
            assert!(property.property_type().matches(&property.value()));
        }
    }

    #[test]
    fn test_employer_info_attribute_layout() {
        let info = EmployerInfo {
            name: "Klinikum".to_string(),
            accommodation: Accommodation {
                location: "Wien".to_string(),
                from: "2024-01-01".to_string(),
                to: "2024-06-30".to_string(),
            },
        };

        let AttributeValue::M(map) = info.to_attribute() else {
            panic!("expected map");
        };
        assert_eq!(map.get("Name"), Some(&AttributeValue::S("Klinikum".into())));
        let accommodation = map.get("Accommodation").and_then(AttributeValue::as_m).unwrap();
        assert_eq!(
            accommodation.get("Location"),
            Some(&AttributeValue::S("Wien".into()))
        );
    }
}

//! Client form validation

use serde::{Deserialize, Serialize};

use crate::error::{ContaError, ContaResult};
use crate::models::client::{is_digits, CNPJ_LEN, CPF_LEN, PHONE_LEN};
use crate::models::{Client, ClientId, Money};

use super::non_empty;

/// Candidate client payload. An absent (or zero) id means "create".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientForm {
    pub id: Option<ClientId>,
    pub name: String,
    pub cpf: Option<String>,
    pub cnpj: Option<String>,
    pub email: Option<String>,
    pub phone: String,
    pub fee: Money,
    pub fee_due_day: u8,
}

impl From<Client> for ClientForm {
    /// Load a stored client for editing
    fn from(client: Client) -> Self {
        Self {
            id: Some(client.id),
            name: client.name,
            cpf: client.cpf,
            cnpj: client.cnpj,
            email: client.email,
            phone: client.phone,
            fee: client.fee,
            fee_due_day: client.fee_due_day,
        }
    }
}

impl ClientForm {
    /// The id to update, if this form edits an existing client
    pub fn existing_id(&self) -> Option<ClientId> {
        self.id.filter(ClientId::is_valid)
    }

    /// Check the form and return its normalized version
    ///
    /// Documents are only checked on create; an update keeps the stored ones.
    pub fn validate(self) -> ContaResult<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ContaError::validation("CLIENT.INVALID_NAME", "name"));
        }

        let phone = self.phone.trim().to_string();
        if !is_digits(&phone, PHONE_LEN) {
            return Err(ContaError::validation("CLIENT.INVALID_PHONE", "phone"));
        }

        let existing = self.existing_id();
        let cpf = non_empty(self.cpf);
        let cnpj = non_empty(self.cnpj);

        if existing.is_none() {
            if cpf.is_none() && cnpj.is_none() {
                return Err(ContaError::validation("CLIENT.NO_DOCUMENT_PROVIDED", "cpf"));
            }
            if cpf.as_deref().is_some_and(|c| !is_digits(c, CPF_LEN)) {
                return Err(ContaError::validation("CLIENT.INVALID_DOCUMENT", "cpf"));
            }
            if cnpj.as_deref().is_some_and(|c| !is_digits(c, CNPJ_LEN)) {
                return Err(ContaError::validation("CLIENT.INVALID_DOCUMENT", "cnpj"));
            }
        }

        Ok(Self {
            id: existing,
            name,
            cpf,
            cnpj,
            email: non_empty(self.email),
            phone,
            fee: self.fee,
            fee_due_day: self.fee_due_day,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ClientForm {
        ClientForm {
            name: "  Ana Souza ".into(),
            cpf: Some("12345678901".into()),
            phone: "11999998888".into(),
            fee: Money::from_cents(15000),
            fee_due_day: 10,
            ..Default::default()
        }
    }

    fn code_of(form: ClientForm) -> &'static str {
        form.validate().unwrap_err().code()
    }

    #[test]
    fn test_valid_form_is_normalized() {
        let valid = ClientForm {
            email: Some("   ".into()),
            cnpj: Some(String::new()),
            ..form()
        }
        .validate()
        .unwrap();

        assert_eq!(valid.name, "Ana Souza");
        assert_eq!(valid.email, None);
        assert_eq!(valid.cnpj, None);
    }

    #[test]
    fn test_name_required() {
        assert_eq!(
            code_of(ClientForm {
                name: "   ".into(),
                ..form()
            }),
            "CLIENT.INVALID_NAME"
        );
    }

    #[test]
    fn test_phone_must_have_eleven_digits() {
        for phone in ["1199999888", "(11)99999-8888", "119999988889", ""] {
            let err = ClientForm {
                phone: phone.into(),
                ..form()
            }
            .validate()
            .unwrap_err();
            assert_eq!(err.code(), "CLIENT.INVALID_PHONE");
            assert_eq!(err.params().get("field").map(String::as_str), Some("phone"));
        }
    }

    #[test]
    fn test_document_required_on_create() {
        assert_eq!(
            code_of(ClientForm {
                cpf: None,
                cnpj: None,
                ..form()
            }),
            "CLIENT.NO_DOCUMENT_PROVIDED"
        );
    }

    #[test]
    fn test_document_lengths() {
        let cnpj_only = ClientForm {
            cpf: None,
            cnpj: Some("12345678000199".into()),
            ..form()
        };
        assert!(cnpj_only.validate().is_ok());

        let short_cpf = ClientForm {
            cpf: Some("1234567890".into()),
            ..form()
        };
        assert_eq!(code_of(short_cpf), "CLIENT.INVALID_DOCUMENT");

        let bad_cnpj = ClientForm {
            cnpj: Some("1234".into()),
            ..form()
        };
        let err = bad_cnpj.validate().unwrap_err();
        assert_eq!(err.code(), "CLIENT.INVALID_DOCUMENT");
        assert_eq!(err.params().get("field").map(String::as_str), Some("cnpj"));
    }

    #[test]
    fn test_update_skips_document_checks() {
        let update = ClientForm {
            id: Some(ClientId::new(4)),
            cpf: None,
            cnpj: Some("bad".into()),
            ..form()
        };
        let valid = update.validate().unwrap();
        assert_eq!(valid.id, Some(ClientId::new(4)));
        assert_eq!(valid.cnpj.as_deref(), Some("bad"));
    }

    #[test]
    fn test_zero_id_means_create() {
        let zero = ClientForm {
            id: Some(ClientId::new(0)),
            cpf: None,
            ..form()
        };
        assert_eq!(code_of(zero), "CLIENT.NO_DOCUMENT_PROVIDED");
    }
}

//! Wire types shared by the renderer, the error adapter and the handlers

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// View-specific data handed to the renderer. Insertion order is kept on the wire.
pub type Props = Map<String, Value>;

/// Flat field-name -> message map of validation errors
pub type FlashErrors = Map<String, Value>;

/// The unit of protocol exchange: one logical view plus its data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageObject {
    pub component: String,
    pub props: Props,
    pub url: String,
    pub version: String,
}

impl PageObject {
    pub fn new(
        component: impl Into<String>,
        props: Props,
        url: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            component: component.into(),
            props,
            url: url.into(),
            version: version.into(),
        }
    }
}

/// Shared `auth` prop: `{"user": null}` or `{"user": {...}}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthProjection {
    pub user: Option<AuthUser>,
}

impl AuthProjection {
    pub fn anonymous() -> Self {
        Self { user: None }
    }
}

/// Projection of the authenticated principal exposed to every view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(rename = "rol_id")]
    pub role_id: Option<i64>,
    #[serde(rename = "rol_nombre")]
    pub role_name: Option<String>,
    #[serde(rename = "permisos")]
    pub permissions: Vec<AuthPermission>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthPermission {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "modulo_nombre")]
    pub module_name: Option<String>,
}

//! Section kinds and their payloads.
//!
//! Every section has a [`SectionKind`] decided by the handler type string of
//! its declaration. The kind fixes the payload shape:
//!
//! - `Text`: an opaque string
//! - property kinds (`SingleTag`, `NameValue`, `Dictionary`, `AppSettings`,
//!   `ConnectionStrings`, `Custom`): a flat [`PropertySet`] of Add/Remove/Clear
//!   directives, described by a static [`PropertySchema`]
//! - native kinds (`XDictionary`, `XList`, `XString`): a recursive
//!   [`NativeTree`] of named dictionaries, lists and strings

use tracing::debug;

use crate::{ConfigDocument, Result, SectionHandle, dom};

mod errors;
mod native;
mod properties;

pub use errors::SectionError;
pub use native::{NativeShape, NativeTree, NativeTreeMut, XValue};
pub use properties::{Directive, PropertyEntry, PropertySet, PropertySetMut};

/// How keys of a property set are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyComparison {
    /// Exact string equality
    Ordinal,
    /// Equality ignoring ASCII case
    IgnoreCase,
}

impl KeyComparison {
    pub fn matches(&self, a: &str, b: &str) -> bool {
        match self {
            KeyComparison::Ordinal => a == b,
            KeyComparison::IgnoreCase => a.eq_ignore_ascii_case(b),
        }
    }
}

/// Static description of a property-bearing section kind
#[derive(Debug, PartialEq, Eq)]
pub struct PropertySchema {
    /// Attribute holding an entry's key
    pub key_attribute: &'static str,
    /// Attribute holding an entry's value
    pub value_attribute: &'static str,
    /// Directives this kind accepts
    pub directives: &'static [Directive],
    pub keys: KeyComparison,
}

impl PropertySchema {
    pub fn allows(&self, directive: Directive) -> bool {
        self.directives.contains(&directive)
    }
}

const ALL_DIRECTIVES: &[Directive] = &[Directive::Add, Directive::Remove, Directive::Clear];

static KEY_VALUE: PropertySchema = PropertySchema {
    key_attribute: "key",
    value_attribute: "value",
    directives: ALL_DIRECTIVES,
    keys: KeyComparison::Ordinal,
};

static SINGLE_TAG: PropertySchema = PropertySchema {
    key_attribute: "key",
    value_attribute: "value",
    directives: &[Directive::Add],
    keys: KeyComparison::Ordinal,
};

static CASE_INSENSITIVE: PropertySchema = PropertySchema {
    key_attribute: "key",
    value_attribute: "value",
    directives: ALL_DIRECTIVES,
    keys: KeyComparison::IgnoreCase,
};

static CONNECTION_STRINGS: PropertySchema = PropertySchema {
    key_attribute: "name",
    value_attribute: "connectionString",
    directives: ALL_DIRECTIVES,
    keys: KeyComparison::Ordinal,
};

/// The kind of a section.
///
/// The mapping to handler type strings is a fixed table; see
/// [`handler_type`](Self::handler_type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Text,
    SingleTag,
    NameValue,
    Dictionary,
    AppSettings,
    ConnectionStrings,
    Custom,
    XDictionary,
    XList,
    XString,
}

impl SectionKind {
    /// Every kind, in table order
    pub const ALL: [SectionKind; 10] = [
        SectionKind::Text,
        SectionKind::SingleTag,
        SectionKind::NameValue,
        SectionKind::Dictionary,
        SectionKind::AppSettings,
        SectionKind::ConnectionStrings,
        SectionKind::Custom,
        SectionKind::XDictionary,
        SectionKind::XList,
        SectionKind::XString,
    ];

    /// Handler type string written into declarations
    pub fn handler_type(&self) -> &'static str {
        match self {
            SectionKind::Text => "System.Configuration.IgnoreSectionHandler",
            SectionKind::SingleTag => "System.Configuration.SingleTagSectionHandler",
            SectionKind::NameValue => "System.Configuration.NameValueSectionHandler",
            SectionKind::Dictionary => "System.Configuration.DictionarySectionHandler",
            SectionKind::AppSettings => "System.Configuration.AppSettingsSection",
            SectionKind::ConnectionStrings => "System.Configuration.ConnectionStringsSection",
            SectionKind::Custom => "Cfgdoc.CustomSection",
            SectionKind::XDictionary => "Cfgdoc.XDictionarySection",
            SectionKind::XList => "Cfgdoc.XListSection",
            SectionKind::XString => "Cfgdoc.XStringSection",
        }
    }

    /// Reverse lookup of the handler table.
    ///
    /// Handler strings may carry an assembly qualification after a comma
    /// (`Type, Assembly, Version=...`); only the type part is compared.
    /// Unknown handler types are treated as `Custom`.
    pub fn from_handler_type(handler: &str) -> SectionKind {
        let type_name = handler.split(',').next().unwrap_or_default().trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.handler_type() == type_name)
            .unwrap_or(SectionKind::Custom)
    }

    /// Short name used in logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            SectionKind::Text => "text",
            SectionKind::SingleTag => "single-tag",
            SectionKind::NameValue => "name-value",
            SectionKind::Dictionary => "dictionary",
            SectionKind::AppSettings => "app-settings",
            SectionKind::ConnectionStrings => "connection-strings",
            SectionKind::Custom => "custom",
            SectionKind::XDictionary => "native-dictionary",
            SectionKind::XList => "native-list",
            SectionKind::XString => "native-string",
        }
    }

    /// The property schema for property-bearing kinds
    pub fn schema(&self) -> Option<&'static PropertySchema> {
        match self {
            SectionKind::SingleTag => Some(&SINGLE_TAG),
            SectionKind::NameValue | SectionKind::AppSettings | SectionKind::Custom => Some(&KEY_VALUE),
            SectionKind::Dictionary => Some(&CASE_INSENSITIVE),
            SectionKind::ConnectionStrings => Some(&CONNECTION_STRINGS),
            SectionKind::Text | SectionKind::XDictionary | SectionKind::XList | SectionKind::XString => None,
        }
    }

    /// The native tree shape for native kinds
    pub fn native_shape(&self) -> Option<NativeShape> {
        match self {
            SectionKind::XDictionary => Some(NativeShape::Dictionary),
            SectionKind::XList => Some(NativeShape::List),
            SectionKind::XString => Some(NativeShape::String),
            _ => None,
        }
    }

    pub fn is_native(&self) -> bool {
        self.native_shape().is_some()
    }

    /// Returns true if a section of this kind can be encrypted as a whole.
    ///
    /// Property sections and native dictionaries qualify; text, list and
    /// string sections do not.
    pub fn is_protectable(&self) -> bool {
        self.schema().is_some() || *self == SectionKind::XDictionary
    }
}

/// Sections present in every configuration without a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinSection {
    AppSettings,
    ConnectionStrings,
}

impl BuiltinSection {
    pub fn element_name(&self) -> &'static str {
        match self {
            BuiltinSection::AppSettings => "appSettings",
            BuiltinSection::ConnectionStrings => "connectionStrings",
        }
    }

    pub fn kind(&self) -> SectionKind {
        match self {
            BuiltinSection::AppSettings => SectionKind::AppSettings,
            BuiltinSection::ConnectionStrings => SectionKind::ConnectionStrings,
        }
    }

    pub fn from_element_name(name: &str) -> Option<BuiltinSection> {
        [BuiltinSection::AppSettings, BuiltinSection::ConnectionStrings]
            .into_iter()
            .find(|builtin| builtin.element_name() == name)
    }
}

/// Fails with `InvalidValue` if `text` holds a character XML cannot carry
pub(crate) fn check_storable(section: &str, text: &str) -> Result<()> {
    match dom::find_invalid_char(text) {
        Some(c) => Err(SectionError::InvalidValue {
            section: section.to_string(),
            reason: format!("character U+{:04X} cannot be stored in XML", u32::from(c)),
        }
        .into()),
        None => Ok(()),
    }
}

impl ConfigDocument {
    /// Path of a section as a string, for error messages
    pub(crate) fn section_label(&self, section: SectionHandle) -> String {
        self.section_path(section)
            .map(|path| path.to_string())
            .unwrap_or_else(|_| section.node().to_string())
    }

    /// Fails with `KindMismatch` unless `accept` holds for the section's kind
    pub(crate) fn expect_kind(
        &self,
        section: SectionHandle,
        expected: &'static str,
        accept: impl Fn(SectionKind) -> bool,
    ) -> Result<SectionKind> {
        let kind = self.section_kind(section)?;
        if !accept(kind) {
            return Err(SectionError::KindMismatch {
                section: self.section_label(section),
                expected,
                actual: kind.name(),
            }
            .into());
        }
        Ok(kind)
    }

    /// Fails with `Protected` if the node's payload is encrypted
    pub(crate) fn expect_plain(&self, section: SectionHandle, node: crate::dom::NodeId) -> Result<()> {
        if self.is_protected(node)? {
            return Err(SectionError::Protected {
                section: self.section_label(section),
            }
            .into());
        }
        Ok(())
    }

    /// Content of a `Text` section
    pub fn text(&self, section: SectionHandle) -> Result<String> {
        self.expect_kind(section, "text", |kind| kind == SectionKind::Text)?;
        Ok(self.dom().text(section.node())?)
    }

    /// Replaces the content of a `Text` section.
    ///
    /// Setting the current value changes nothing and does not mark the
    /// document dirty. An empty string removes the content but keeps the
    /// section element.
    ///
    /// # Errors
    /// - `SectionError::KindMismatch` unless the section is `Text`
    /// - `SectionError::InvalidValue` for characters XML cannot hold, or for
    ///   a non-empty value made only of whitespace, which loading drops
    pub fn set_text(&mut self, section: SectionHandle, value: impl AsRef<str>) -> Result<()> {
        let value = value.as_ref();
        self.expect_kind(section, "text", |kind| kind == SectionKind::Text)?;
        let label = self.section_label(section);
        check_storable(&label, value)?;
        if !value.is_empty() && value.trim().is_empty() {
            return Err(SectionError::InvalidValue {
                section: label,
                reason: "text made only of whitespace does not survive reloading".to_string(),
            }
            .into());
        }
        let node = section.node();
        let only_text = self
            .dom()
            .children(node)?
            .iter()
            .all(|child| !self.dom().is_element(*child));
        if only_text && self.dom().text(node)? == value {
            return Ok(());
        }

        let dom = self.dom_mut();
        dom.clear_children(node)?;
        if !value.is_empty() {
            let text = dom.create_text(value);
            dom.append_child(node, text)?;
        }
        debug!(section = %label, bytes = value.len(), "set section text");
        self.commit()
    }
}

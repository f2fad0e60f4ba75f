//! Element and attribute vocabulary of configuration documents.

/// Root element of every configuration document.
pub const CONFIGURATION: &str = "configuration";

/// Element holding the declaration tree. Always the first child of the root.
pub const CONFIG_SECTIONS: &str = "configSections";

/// Declaration element for a section group.
pub const SECTION_GROUP: &str = "sectionGroup";

/// Declaration element for a section.
pub const SECTION: &str = "section";

/// Name attribute on declarations and native tree nodes.
pub const ATTR_NAME: &str = "name";

/// Handler type attribute on declarations.
pub const ATTR_TYPE: &str = "type";

/// Handler type recorded for every section group declaration.
pub const GROUP_HANDLER_TYPE: &str = "System.Configuration.ConfigurationSectionGroup";

/// Directive element names.
pub const DIRECTIVE_ADD: &str = "add";
pub const DIRECTIVE_REMOVE: &str = "remove";
pub const DIRECTIVE_CLEAR: &str = "clear";

/// Native tree element names.
pub const NATIVE_DICTIONARY: &str = "dictionary";
pub const NATIVE_LIST: &str = "list";
pub const NATIVE_STRING: &str = "string";

/// Attribute marking a node whose children have been replaced by a payload.
pub const ATTR_PROTECTED: &str = "protected";

/// Attribute written by foreign protection providers. Documents carrying it are rejected.
pub const ATTR_FOREIGN_PROTECTION: &str = "configProtectionProvider";

/// Payload element vocabulary.
pub const PAYLOAD_ELEMENT: &str = "EncryptedData";
pub const PAYLOAD_KEY_ELEMENT: &str = "EncryptedKey";
pub const PAYLOAD_CIPHER_ELEMENT: &str = "CipherValue";
pub const PAYLOAD_ATTR_VERSION: &str = "version";
pub const PAYLOAD_ATTR_ALGORITHM: &str = "algorithm";
pub const PAYLOAD_ATTR_KEY_ALGORITHM: &str = "keyAlgorithm";
pub const PAYLOAD_ATTR_EPHEMERAL_KEY: &str = "ephemeralKey";

/// Current payload format version.
pub const PAYLOAD_VERSION: &str = "1";

/// Bulk cipher identifier written into payloads.
pub const PAYLOAD_ALGORITHM: &str = "aes-256-gcm";

/// Key-wrapping scheme identifier written into payloads.
pub const PAYLOAD_KEY_ALGORITHM: &str = "x25519-hkdf-sha256-aes-256-gcm";

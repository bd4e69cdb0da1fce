//! Reflection Security & Permissions
//!
//! Controls which reflective operations the dispatcher may perform.
//!
//! Permissions resolve from the most specific level to the least: type,
//! then package (exact entry, then the most specific matching wildcard
//! rule), then the global default, which starts as
//! [`ReflectionPermission::ALL`].
//!
//! ## TOML Configuration
//!
//! ```toml
//! [reflect.permissions]
//! global = "FULL_ACCESS"
//!
//! [reflect.permissions.packages]
//! "com.example.app" = "ALL"
//! "com.example.plugins.*" = "PUBLIC_ONLY"
//! ```

use std::fmt;
use std::path::Path;

use bitflags::bitflags;
use refract_sdk::TypeHandle;
use rustc_hash::FxHashMap;

use crate::config::ReflectConfig;
use crate::error::{ReflectError, ReflectResult};

bitflags! {
    /// Reflection permission flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ReflectionPermission: u8 {
        /// Read public fields
        const READ_PUBLIC = 0x01;
        /// Read non-public fields
        const READ_PRIVATE = 0x02;
        /// Write public fields
        const WRITE_PUBLIC = 0x04;
        /// Write non-public fields
        const WRITE_PRIVATE = 0x08;
        /// Invoke public methods and constructors
        const INVOKE_PUBLIC = 0x10;
        /// Invoke non-public methods and constructors
        const INVOKE_PRIVATE = 0x20;
        /// Suspend the final bit of a static field to overwrite it
        const FORCE_FINAL = 0x40;

        /// READ_PUBLIC | READ_PRIVATE
        const READ_ALL = 0x03;
        /// WRITE_PUBLIC | WRITE_PRIVATE
        const WRITE_ALL = 0x0C;
        /// INVOKE_PUBLIC | INVOKE_PRIVATE
        const INVOKE_ALL = 0x30;
        /// READ_PUBLIC | WRITE_PUBLIC | INVOKE_PUBLIC
        const PUBLIC_ONLY = 0x15;
        /// All read/write/invoke (no final override)
        const FULL_ACCESS = 0x3F;
    }
}

impl ReflectionPermission {
    /// No reflection allowed
    pub const NONE: Self = Self::empty();
    /// Everything including final override
    pub const ALL: Self = Self::all();

    const NAMED: [(&'static str, Self); 13] = [
        ("NONE", Self::NONE),
        ("READ_PUBLIC", Self::READ_PUBLIC),
        ("READ_PRIVATE", Self::READ_PRIVATE),
        ("WRITE_PUBLIC", Self::WRITE_PUBLIC),
        ("WRITE_PRIVATE", Self::WRITE_PRIVATE),
        ("INVOKE_PUBLIC", Self::INVOKE_PUBLIC),
        ("INVOKE_PRIVATE", Self::INVOKE_PRIVATE),
        ("FORCE_FINAL", Self::FORCE_FINAL),
        ("READ_ALL", Self::READ_ALL),
        ("WRITE_ALL", Self::WRITE_ALL),
        ("INVOKE_ALL", Self::INVOKE_ALL),
        ("PUBLIC_ONLY", Self::PUBLIC_ONLY),
        ("FULL_ACCESS", Self::FULL_ACCESS),
    ];

    /// Parse a single permission name, or a hex (`0x..`) / decimal value
    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.to_uppercase();
        if upper == "ALL" {
            return Some(Self::ALL);
        }
        if let Some((_, perm)) = Self::NAMED.iter().find(|(name, _)| *name == upper) {
            return Some(*perm);
        }
        let bits = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u8::from_str_radix(hex, 16).ok()?,
            None => s.parse::<u8>().ok()?,
        };
        Self::from_bits(bits)
    }

    /// Parse pipe-separated permissions (e.g., "READ_PUBLIC|WRITE_PUBLIC")
    pub fn parse_combined(s: &str) -> Option<Self> {
        s.split('|')
            .try_fold(Self::NONE, |acc, part| Some(acc | Self::parse(part.trim())?))
    }
}

impl Default for ReflectionPermission {
    fn default() -> Self {
        Self::ALL
    }
}

impl fmt::Display for ReflectionPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::ALL {
            return f.write_str("ALL");
        }
        match Self::NAMED.iter().find(|(_, perm)| perm == self) {
            Some((name, _)) => f.write_str(name),
            None => write!(f, "0x{:02X}", self.bits()),
        }
    }
}

/// Package permission pattern (supports wildcards)
#[derive(Debug, Clone)]
pub struct PackagePermissionRule {
    /// Pattern (e.g., "com.example", "plugins.*", "plugins.**", "**")
    pub pattern: String,
    /// Permissions for matching packages
    pub permissions: ReflectionPermission,
}

impl PackagePermissionRule {
    /// Check if a package name matches this pattern
    ///
    /// `prefix.*` matches strict sub-packages of `prefix`; `prefix.**` also
    /// matches `prefix` itself.
    pub fn matches(&self, package: &str) -> bool {
        match self.prefix() {
            None => self.is_catch_all() || self.pattern == package,
            Some(prefix) if self.pattern.ends_with(".**") => package == prefix || is_sub_package(package, prefix),
            Some(prefix) => is_sub_package(package, prefix),
        }
    }

    /// Literal package prefix of a wildcard pattern (`None` for `*`, `**`
    /// and exact names)
    fn prefix(&self) -> Option<&str> {
        self.pattern
            .strip_suffix(".**")
            .or_else(|| self.pattern.strip_suffix(".*"))
    }

    fn is_catch_all(&self) -> bool {
        self.pattern == "*" || self.pattern == "**"
    }

    /// Rank used to order rules; longer literal prefixes rank higher and
    /// exact names outrank every wildcard
    fn specificity(&self) -> usize {
        match self.prefix() {
            Some(prefix) => prefix.len() + 1,
            None if self.is_catch_all() => 0,
            None => usize::MAX,
        }
    }
}

fn is_sub_package(package: &str, prefix: &str) -> bool {
    package
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.len() > 1 && rest.starts_with('.'))
}

/// Store for reflection permissions
#[derive(Debug, Default)]
pub struct PermissionStore {
    global_default: ReflectionPermission,
    /// Type name -> permissions
    types: FxHashMap<String, ReflectionPermission>,
    /// Exact package name -> permissions
    packages: FxHashMap<String, ReflectionPermission>,
    /// Wildcard rules, most specific first
    package_rules: Vec<PackagePermissionRule>,
}

impl PermissionStore {
    /// Create a store that allows everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether anything narrower than the default is configured
    pub fn has_any_restrictions(&self) -> bool {
        self.global_default != ReflectionPermission::ALL
            || !self.types.is_empty()
            || !self.packages.is_empty()
            || !self.package_rules.is_empty()
    }

    // ===== Global Permissions =====

    /// Set global default permissions
    pub fn set_global(&mut self, permissions: ReflectionPermission) {
        self.global_default = permissions;
    }

    /// Get global default permissions
    pub fn get_global(&self) -> ReflectionPermission {
        self.global_default
    }

    // ===== Type Permissions =====

    /// Set permissions for one type, by qualified name
    pub fn set_type(&mut self, type_name: &str, permissions: ReflectionPermission) {
        self.types.insert(type_name.to_string(), permissions);
    }

    /// Permissions set for `type_name` itself, if any
    pub fn get_type(&self, type_name: &str) -> Option<ReflectionPermission> {
        self.types.get(type_name).copied()
    }

    // ===== Package Permissions =====

    /// Set permissions for one package, by exact name
    pub fn set_package(&mut self, package: &str, permissions: ReflectionPermission) {
        self.packages.insert(package.to_string(), permissions);
    }

    /// Permissions set for exactly `package`, if any
    pub fn get_package(&self, package: &str) -> Option<ReflectionPermission> {
        self.packages.get(package).copied()
    }

    /// Exact package entry, else the most specific matching rule
    pub fn get_package_resolved(&self, package: &str) -> Option<ReflectionPermission> {
        self.get_package(package).or_else(|| {
            self.package_rules
                .iter()
                .find(|rule| rule.matches(package))
                .map(|rule| rule.permissions)
        })
    }

    /// Add a wildcard rule
    ///
    /// Rules are kept ordered by specificity; among equally specific rules
    /// the earlier one wins.
    pub fn add_package_rule(&mut self, rule: PackagePermissionRule) {
        let rank = rule.specificity();
        let at = self
            .package_rules
            .iter()
            .position(|existing| existing.specificity() < rank)
            .unwrap_or(self.package_rules.len());
        self.package_rules.insert(at, rule);
    }

    // ===== Permission Resolution =====

    /// Resolve permissions for a type: type entry, package, then global
    pub fn resolve(&self, ty: &TypeHandle) -> ReflectionPermission {
        self.get_type(ty.name())
            .or_else(|| self.get_package_resolved(ty.package()))
            .unwrap_or(self.global_default)
    }

    // ===== TOML Configuration =====

    /// Load permissions from TOML configuration
    pub fn load_from_toml(&mut self, toml_content: &str) -> ReflectResult<()> {
        ReflectConfig::from_toml_str(toml_content)?.apply(self)
    }

    /// Load permissions from a TOML file
    pub fn load_from_file(&mut self, path: &Path) -> ReflectResult<()> {
        ReflectConfig::load(path)?.apply(self)
    }
}

fn require(
    store: &PermissionStore,
    ty: &TypeHandle,
    is_private: bool,
    (public, private): (ReflectionPermission, ReflectionPermission),
    action: &str,
) -> ReflectResult<()> {
    let required = if is_private { private } else { public };
    if store.resolve(ty).contains(required) {
        return Ok(());
    }
    Err(ReflectError::PermissionDenied(format!(
        "cannot {} {} members of {}",
        action,
        if is_private { "non-public" } else { "public" },
        ty.name()
    )))
}

/// Check field read permission
pub fn check_field_read(store: &PermissionStore, ty: &TypeHandle, is_private: bool) -> ReflectResult<()> {
    let pair = (ReflectionPermission::READ_PUBLIC, ReflectionPermission::READ_PRIVATE);
    require(store, ty, is_private, pair, "read")
}

/// Check field write permission
pub fn check_field_write(store: &PermissionStore, ty: &TypeHandle, is_private: bool) -> ReflectResult<()> {
    let pair = (ReflectionPermission::WRITE_PUBLIC, ReflectionPermission::WRITE_PRIVATE);
    require(store, ty, is_private, pair, "write")
}

/// Check method or constructor invocation permission
pub fn check_invoke(store: &PermissionStore, ty: &TypeHandle, is_private: bool) -> ReflectResult<()> {
    let pair = (ReflectionPermission::INVOKE_PUBLIC, ReflectionPermission::INVOKE_PRIVATE);
    require(store, ty, is_private, pair, "invoke")
}

/// Check permission to overwrite a final static field
pub fn check_force_final(store: &PermissionStore, ty: &TypeHandle) -> ReflectResult<()> {
    if store.resolve(ty).contains(ReflectionPermission::FORCE_FINAL) {
        return Ok(());
    }
    Err(ReflectError::PermissionDenied(format!(
        "cannot overwrite final fields of {}",
        ty.name()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use refract_sdk::{builtin, TypeKind};

    fn plugin_type() -> TypeHandle {
        TypeHandle::new(
            "com.example.plugins.Widget",
            TypeKind::Class,
            Some(builtin::object()),
            vec![],
        )
    }

    #[test]
    fn test_permission_flags() {
        assert_eq!(ReflectionPermission::NONE.bits(), 0x00);
        assert_eq!(ReflectionPermission::ALL.bits(), 0x7F);
        assert_eq!(ReflectionPermission::READ_ALL.bits(), 0x03);
        assert_eq!(
            ReflectionPermission::FULL_ACCESS | ReflectionPermission::FORCE_FINAL,
            ReflectionPermission::ALL
        );
    }

    #[test]
    fn test_permission_contains() {
        assert!(ReflectionPermission::ALL.contains(ReflectionPermission::READ_PUBLIC));
        assert!(ReflectionPermission::ALL.contains(ReflectionPermission::FORCE_FINAL));
        assert!(!ReflectionPermission::PUBLIC_ONLY.contains(ReflectionPermission::READ_PRIVATE));
        assert!(ReflectionPermission::PUBLIC_ONLY.contains(ReflectionPermission::READ_PUBLIC));
        assert!(!ReflectionPermission::FULL_ACCESS.contains(ReflectionPermission::FORCE_FINAL));
    }

    #[test]
    fn test_permission_parse() {
        assert_eq!(ReflectionPermission::parse("ALL"), Some(ReflectionPermission::ALL));
        assert_eq!(ReflectionPermission::parse("all"), Some(ReflectionPermission::ALL));
        assert_eq!(
            ReflectionPermission::parse("PUBLIC_ONLY"),
            Some(ReflectionPermission::PUBLIC_ONLY)
        );
        assert_eq!(ReflectionPermission::parse("0x7F"), Some(ReflectionPermission::ALL));
        assert_eq!(ReflectionPermission::parse("127"), Some(ReflectionPermission::ALL));
        assert_eq!(ReflectionPermission::parse("0xFF"), None);
        assert_eq!(ReflectionPermission::parse("EVERYTHING"), None);
    }

    #[test]
    fn test_permission_combined_str() {
        let perms = ReflectionPermission::parse_combined("READ_PUBLIC|WRITE_PUBLIC").unwrap();
        assert!(perms.contains(ReflectionPermission::READ_PUBLIC));
        assert!(perms.contains(ReflectionPermission::WRITE_PUBLIC));
        assert!(!perms.contains(ReflectionPermission::READ_PRIVATE));
        assert_eq!(ReflectionPermission::parse_combined("READ_PUBLIC|BOGUS"), None);
    }

    #[test]
    fn test_permission_display() {
        assert_eq!(ReflectionPermission::ALL.to_string(), "ALL");
        assert_eq!(ReflectionPermission::PUBLIC_ONLY.to_string(), "PUBLIC_ONLY");
        assert_eq!(
            (ReflectionPermission::READ_PUBLIC | ReflectionPermission::INVOKE_PUBLIC).to_string(),
            "0x11"
        );
    }

    #[test]
    fn test_permission_store_global() {
        let mut store = PermissionStore::new();
        assert_eq!(store.get_global(), ReflectionPermission::ALL);

        store.set_global(ReflectionPermission::PUBLIC_ONLY);
        assert_eq!(store.get_global(), ReflectionPermission::PUBLIC_ONLY);
    }

    #[test]
    fn test_permission_store_type() {
        let mut store = PermissionStore::new();

        store.set_type("app.Account", ReflectionPermission::FULL_ACCESS);
        assert_eq!(store.get_type("app.Account"), Some(ReflectionPermission::FULL_ACCESS));
        assert_eq!(store.get_type("app.Other"), None);
    }

    #[test]
    fn test_permission_store_package_rules() {
        let mut store = PermissionStore::new();

        store.add_package_rule(PackagePermissionRule {
            pattern: "plugins.*".to_string(),
            permissions: ReflectionPermission::PUBLIC_ONLY,
        });

        assert_eq!(store.get_package_resolved("plugins.foo"), Some(ReflectionPermission::PUBLIC_ONLY));
        assert_eq!(store.get_package_resolved("plugins"), None);
        assert_eq!(store.get_package_resolved("pluginsx.foo"), None);

        store.set_package("plugins.core", ReflectionPermission::ALL);
        assert_eq!(store.get_package_resolved("plugins.core"), Some(ReflectionPermission::ALL));
    }

    #[test]
    fn test_permission_resolution() {
        let mut store = PermissionStore::new();
        store.set_type("com.example.plugins.Widget", ReflectionPermission::FULL_ACCESS);
        store.set_package("com.example.plugins", ReflectionPermission::PUBLIC_ONLY);
        store.set_global(ReflectionPermission::READ_PUBLIC);

        assert_eq!(store.resolve(&plugin_type()), ReflectionPermission::FULL_ACCESS);

        let sibling = TypeHandle::new("com.example.plugins.Gadget", TypeKind::Class, Some(builtin::object()), vec![]);
        assert_eq!(store.resolve(&sibling), ReflectionPermission::PUBLIC_ONLY);
        assert_eq!(store.resolve(&builtin::string()), ReflectionPermission::READ_PUBLIC);
    }

    #[test]
    fn test_specific_rules_win_over_broad_ones() {
        let mut store = PermissionStore::new();
        for (pattern, permissions) in [
            ("**", ReflectionPermission::NONE),
            ("com.**", ReflectionPermission::READ_PUBLIC),
            ("com.example.plugins.*", ReflectionPermission::PUBLIC_ONLY),
            ("com.example.*", ReflectionPermission::READ_ALL),
        ] {
            store.add_package_rule(PackagePermissionRule {
                pattern: pattern.to_string(),
                permissions,
            });
        }

        assert_eq!(
            store.get_package_resolved("com.example.plugins.ui"),
            Some(ReflectionPermission::PUBLIC_ONLY)
        );
        assert_eq!(store.get_package_resolved("com.example.core"), Some(ReflectionPermission::READ_ALL));
        assert_eq!(store.get_package_resolved("com"), Some(ReflectionPermission::READ_PUBLIC));
        assert_eq!(store.get_package_resolved("org.other"), Some(ReflectionPermission::NONE));
    }

    #[test]
    fn test_has_any_restrictions() {
        let mut store = PermissionStore::new();
        assert!(!store.has_any_restrictions());

        store.set_global(ReflectionPermission::PUBLIC_ONLY);
        assert!(store.has_any_restrictions());

        store.set_global(ReflectionPermission::ALL);
        assert!(!store.has_any_restrictions());

        store.set_type("app.Vault", ReflectionPermission::NONE);
        assert!(store.has_any_restrictions());
    }

    #[test]
    fn test_load_from_toml() {
        let mut store = PermissionStore::new();

        let toml = r#"
[reflect.permissions]
global = "PUBLIC_ONLY"

[reflect.permissions.packages]
"com.example.app" = "ALL"
"com.example.plugins.*" = "READ_PUBLIC|INVOKE_PUBLIC"
"#;

        store.load_from_toml(toml).unwrap();

        assert_eq!(store.get_global(), ReflectionPermission::PUBLIC_ONLY);
        assert_eq!(store.get_package("com.example.app"), Some(ReflectionPermission::ALL));
        assert_eq!(
            store.get_package_resolved("com.example.plugins.ui"),
            ReflectionPermission::from_bits(0x11)
        );
    }

    #[test]
    fn test_check_permission_helpers() {
        let mut store = PermissionStore::new();
        store.set_global(ReflectionPermission::PUBLIC_ONLY);
        let ty = plugin_type();

        assert!(check_field_read(&store, &ty, false).is_ok());
        assert!(check_field_read(&store, &ty, true).is_err());

        assert!(check_field_write(&store, &ty, false).is_ok());
        assert!(check_field_write(&store, &ty, true).is_err());

        assert!(check_invoke(&store, &ty, false).is_ok());
        assert!(check_invoke(&store, &ty, true).is_err());

        assert!(check_force_final(&store, &ty).is_err());
        store.set_package("com.example.plugins", ReflectionPermission::ALL);
        assert!(check_force_final(&store, &ty).is_ok());
    }

    #[test]
    fn test_package_pattern_matching() {
        let rule = PackagePermissionRule {
            pattern: "plugins.*".to_string(),
            permissions: ReflectionPermission::PUBLIC_ONLY,
        };

        assert!(rule.matches("plugins.foo"));
        assert!(rule.matches("plugins.bar.baz"));
        assert!(!rule.matches("plugins"));
        assert!(!rule.matches("other"));

        let recursive = PackagePermissionRule {
            pattern: "plugins.**".to_string(),
            permissions: ReflectionPermission::PUBLIC_ONLY,
        };
        assert!(recursive.matches("plugins"));
        assert!(recursive.matches("plugins.deep.nested"));

        let everything = PackagePermissionRule {
            pattern: "**".to_string(),
            permissions: ReflectionPermission::NONE,
        };
        assert!(everything.matches("anything"));
        assert!(everything.matches(""));
    }
}

//! Naming conventions shared by detection and generation
//!
//! Every derived name (table, foreign key, pivot table, artifact type, route
//! path, media field) goes through this module so detection and generation
//! agree on the same conventions.

use inflector::Inflector;

/// Naming helpers for code generation
pub struct Naming;

impl Naming {
    /// Convert string to `snake_case`
    ///
    /// # Examples
    ///
    /// ```
    /// # use acton_forge::naming::Naming;
    /// assert_eq!(Naming::to_snake_case("UserProfile"), "user_profile");
    /// assert_eq!(Naming::to_snake_case("HTTPRequest"), "http_request");
    /// ```
    #[must_use]
    pub fn to_snake_case(input: &str) -> String {
        input.to_snake_case()
    }

    /// Convert string to `PascalCase`
    ///
    /// # Examples
    ///
    /// ```
    /// # use acton_forge::naming::Naming;
    /// assert_eq!(Naming::to_pascal_case("user_profile"), "UserProfile");
    /// assert_eq!(Naming::to_pascal_case("in-review"), "InReview");
    /// ```
    #[must_use]
    pub fn to_pascal_case(input: &str) -> String {
        input.to_pascal_case()
    }

    /// Convert string to kebab-case
    #[must_use]
    pub fn to_kebab_case(input: &str) -> String {
        input.to_kebab_case()
    }

    /// Pluralize a word
    ///
    /// The inflector library has known limitations with some irregular plurals.
    /// Entity names are typically regular words.
    #[must_use]
    pub fn pluralize(input: &str) -> String {
        input.to_plural()
    }

    /// Convert an entity name to its table name (`snake_case` plural)
    ///
    /// # Examples
    ///
    /// ```
    /// # use acton_forge::naming::Naming;
    /// assert_eq!(Naming::to_table_name("Invoice"), "invoices");
    /// assert_eq!(Naming::to_table_name("UserProfile"), "user_profiles");
    /// ```
    #[must_use]
    pub fn to_table_name(entity: &str) -> String {
        Self::pluralize(&Self::to_snake_case(entity))
    }

    /// Convert an entity name to its route path (kebab-case plural)
    ///
    /// # Examples
    ///
    /// ```
    /// # use acton_forge::naming::Naming;
    /// assert_eq!(Naming::to_route_path("Invoice"), "/invoices");
    /// assert_eq!(Naming::to_route_path("UserProfile"), "/user-profiles");
    /// ```
    #[must_use]
    pub fn to_route_path(entity: &str) -> String {
        format!("/{}", Self::pluralize(&Self::to_kebab_case(entity)))
    }

    /// Human-readable title from an entity name
    #[must_use]
    pub fn to_title(entity: &str) -> String {
        entity.to_title_case()
    }

    /// Human-readable plural title
    #[must_use]
    pub fn to_plural_title(entity: &str) -> String {
        Self::pluralize(&Self::to_title(entity))
    }

    /// Foreign key column pointing at an entity or relation name
    ///
    /// # Examples
    ///
    /// ```
    /// # use acton_forge::naming::Naming;
    /// assert_eq!(Naming::to_foreign_key("Customer"), "customer_id");
    /// assert_eq!(Naming::to_foreign_key("billing_address"), "billing_address_id");
    /// ```
    #[must_use]
    pub fn to_foreign_key(name: &str) -> String {
        format!("{}_id", Self::to_snake_case(name))
    }

    /// Conventional pivot table for a many-to-many pair
    ///
    /// Both sides are singular `snake_case`, joined in alphabetical order.
    ///
    /// # Examples
    ///
    /// ```
    /// # use acton_forge::naming::Naming;
    /// assert_eq!(Naming::to_pivot_table("Invoice", "Tag"), "invoice_tag");
    /// assert_eq!(Naming::to_pivot_table("Tag", "Invoice"), "invoice_tag");
    /// ```
    #[must_use]
    pub fn to_pivot_table(left: &str, right: &str) -> String {
        let mut pair = [Self::to_snake_case(left), Self::to_snake_case(right)];
        pair.sort();
        pair.join("_")
    }

    /// Field name for a media collection
    ///
    /// # Examples
    ///
    /// ```
    /// # use acton_forge::naming::Naming;
    /// assert_eq!(Naming::to_field_name("profile-photos"), "profile_photos");
    /// assert_eq!(Naming::to_field_name("Avatar"), "avatar");
    /// ```
    #[must_use]
    pub fn to_field_name(collection: &str) -> String {
        Self::to_snake_case(collection)
    }

    /// Whether `candidate` is usable as a Rust identifier
    #[must_use]
    pub fn is_identifier(candidate: &str) -> bool {
        let mut chars = candidate.chars();
        chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!(Naming::to_snake_case("UserProfile"), "user_profile");
        assert_eq!(Naming::to_snake_case("HTTPRequest"), "http_request");
        assert_eq!(Naming::to_snake_case("simple"), "simple");
    }

    #[test]
    fn test_pascal_case() {
        assert_eq!(Naming::to_pascal_case("user_profile"), "UserProfile");
        assert_eq!(Naming::to_pascal_case("draft"), "Draft");
    }

    #[test]
    fn test_table_name() {
        assert_eq!(Naming::to_table_name("Invoice"), "invoices");
        assert_eq!(Naming::to_table_name("Category"), "categories");
        assert_eq!(Naming::to_table_name("UserProfile"), "user_profiles");
    }

    #[test]
    fn test_route_path() {
        assert_eq!(Naming::to_route_path("Invoice"), "/invoices");
        assert_eq!(Naming::to_route_path("UserProfile"), "/user-profiles");
    }

    #[test]
    fn test_plural_title() {
        assert_eq!(Naming::to_plural_title("Invoice"), "Invoices");
        assert_eq!(Naming::to_plural_title("UserProfile"), "User Profiles");
    }

    #[test]
    fn test_pivot_table_is_order_independent() {
        assert_eq!(
            Naming::to_pivot_table("Role", "User"),
            Naming::to_pivot_table("User", "Role")
        );
    }

    #[test]
    fn test_identifier() {
        assert!(Naming::is_identifier("customer_id"));
        assert!(!Naming::is_identifier("1st"));
        assert!(!Naming::is_identifier("in-review"));
        assert!(!Naming::is_identifier(""));
    }
}

//! Naming conventions for resources and routes
//!
//! Pure string transformations used to derive resource identifiers from
//! controller names. Every derived name can be overridden at declaration time,
//! so nothing here inspects types or reflects over the program.

use inflector::Inflector;

/// Singular/plural pairs Inflector does not round-trip
const IRREGULAR: [(&str, &str); 11] = [
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("datum", "data"),
    ("medium", "media"),
    ("mouse", "mice"),
    ("ox", "oxen"),
    ("foot", "feet"),
    ("tooth", "teeth"),
    ("goose", "geese"),
];

/// Words whose singular and plural forms are the same
const UNCOUNTABLE: [&str; 8] = [
    "equipment",
    "fish",
    "information",
    "metadata",
    "news",
    "series",
    "sheep",
    "species",
];

/// Apply `irregular` to the last `_`-separated word of `input`
fn inflect_tail(input: &str, irregular: impl Fn(&str) -> Option<&'static str>) -> Option<String> {
    let (head, tail) = input.rsplit_once('_').unwrap_or(("", input));
    let replaced = if UNCOUNTABLE.contains(&tail) {
        tail
    } else {
        irregular(tail)?
    };
    Some(if head.is_empty() {
        replaced.to_string()
    } else {
        format!("{head}_{replaced}")
    })
}

/// Naming helpers shared by the tree builder and the route generator
pub struct ResourceNaming;

impl ResourceNaming {
    /// Convert string to `snake_case`
    ///
    /// # Examples
    ///
    /// ```
    /// # use acton_resources::naming::ResourceNaming;
    /// assert_eq!(ResourceNaming::to_snake_case("DeleteConfirmation"), "delete_confirmation");
    /// assert_eq!(ResourceNaming::to_snake_case("HTTPRequest"), "http_request");
    /// ```
    #[must_use]
    pub fn to_snake_case(input: &str) -> String {
        input.to_snake_case()
    }

    /// Pluralize a word
    ///
    /// # Examples
    ///
    /// ```
    /// # use acton_resources::naming::ResourceNaming;
    /// assert_eq!(ResourceNaming::pluralize("post"), "posts");
    /// assert_eq!(ResourceNaming::pluralize("category"), "categories");
    /// assert_eq!(ResourceNaming::pluralize("sales_person"), "sales_people");
    /// ```
    #[must_use]
    pub fn pluralize(input: &str) -> String {
        inflect_tail(input, |word| {
            IRREGULAR
                .iter()
                .find(|(singular, plural)| *singular == word || *plural == word)
                .map(|(_, plural)| *plural)
        })
        .unwrap_or_else(|| input.to_plural())
    }

    /// Singularize a word
    ///
    /// # Examples
    ///
    /// ```
    /// # use acton_resources::naming::ResourceNaming;
    /// assert_eq!(ResourceNaming::singularize("comments"), "comment");
    /// assert_eq!(ResourceNaming::singularize("categories"), "category");
    /// assert_eq!(ResourceNaming::singularize("people"), "person");
    /// ```
    #[must_use]
    pub fn singularize(input: &str) -> String {
        inflect_tail(input, |word| {
            IRREGULAR
                .iter()
                .find(|(singular, plural)| *singular == word || *plural == word)
                .map(|(singular, _)| *singular)
        })
        .unwrap_or_else(|| input.to_singular())
    }

    /// Plural path segment for `word`
    ///
    /// A word that already singularizes to something else is taken as the
    /// declared plural and kept. Otherwise its plural is used only when it
    /// singularizes back to `word`; a word that does not round-trip is
    /// mounted as written.
    ///
    /// # Examples
    ///
    /// ```
    /// # use acton_resources::naming::ResourceNaming;
    /// assert_eq!(ResourceNaming::plural_segment("post"), "posts");
    /// assert_eq!(ResourceNaming::plural_segment("comments"), "comments");
    /// assert_eq!(ResourceNaming::plural_segment("people"), "people");
    /// assert_eq!(ResourceNaming::plural_segment("news"), "news");
    /// ```
    #[must_use]
    pub fn plural_segment(word: &str) -> String {
        if Self::singularize(word) != word {
            return word.to_string();
        }
        let plural = Self::pluralize(word);
        if Self::singularize(&plural) == word {
            plural
        } else {
            word.to_string()
        }
    }

    /// Split a controller name into its namespace and base name
    ///
    /// Both `::` and `/` act as namespace separators. A trailing `Controller`
    /// (or `_controller`) suffix is removed from the base.
    ///
    /// # Examples
    ///
    /// ```
    /// # use acton_resources::naming::ResourceNaming;
    /// let (namespace, base) = ResourceNaming::split_controller("Posts::CommentsController");
    /// assert_eq!(namespace, vec!["Posts"]);
    /// assert_eq!(base, "Comments");
    /// ```
    #[must_use]
    pub fn split_controller(controller: &str) -> (Vec<&str>, &str) {
        let mut segments: Vec<&str> = controller
            .split("::")
            .flat_map(|part| part.split('/'))
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();

        let base = segments.pop().unwrap_or_default();
        let base = base
            .strip_suffix("Controller")
            .or_else(|| base.strip_suffix("_controller"))
            .unwrap_or(base);

        (segments, base)
    }

    /// Derive the singular resource identifier for a controller
    ///
    /// Returns an empty string when nothing is left after stripping the
    /// namespace and the controller suffix.
    ///
    /// # Examples
    ///
    /// ```
    /// # use acton_resources::naming::ResourceNaming;
    /// assert_eq!(ResourceNaming::resource_name("Comments"), "comment");
    /// assert_eq!(ResourceNaming::resource_name("Posts::CommentsController"), "comment");
    /// assert_eq!(ResourceNaming::resource_name("posts/delete_confirmations"), "delete_confirmation");
    /// ```
    #[must_use]
    pub fn resource_name(controller: &str) -> String {
        let (_, base) = Self::split_controller(controller);
        if base.is_empty() {
            return String::new();
        }
        Self::singularize(&Self::to_snake_case(base))
    }

    /// The controller's base name in `snake_case`, neither singularized nor
    /// pluralized
    ///
    /// # Examples
    ///
    /// ```
    /// # use acton_resources::naming::ResourceNaming;
    /// assert_eq!(ResourceNaming::segment_name("Posts::SettingsController"), "settings");
    /// assert_eq!(ResourceNaming::segment_name("DeleteConfirmation"), "delete_confirmation");
    /// ```
    #[must_use]
    pub fn segment_name(controller: &str) -> String {
        let (_, base) = Self::split_controller(controller);
        Self::to_snake_case(base)
    }

    /// Derive the parent resource identifier from a controller's namespace
    ///
    /// The innermost namespace segment names the parent.
    ///
    /// # Examples
    ///
    /// ```
    /// # use acton_resources::naming::ResourceNaming;
    /// assert_eq!(ResourceNaming::parent_name("Posts::CommentsController").as_deref(), Some("post"));
    /// assert_eq!(ResourceNaming::parent_name("CommentsController"), None);
    /// ```
    #[must_use]
    pub fn parent_name(controller: &str) -> Option<String> {
        let (namespace, _) = Self::split_controller(controller);
        namespace
            .last()
            .map(|segment| Self::singularize(&Self::to_snake_case(segment)))
    }

    /// Name of the path parameter that identifies a record of `resource`
    /// when it appears as an ancestor
    ///
    /// # Examples
    ///
    /// ```
    /// # use acton_resources::naming::ResourceNaming;
    /// assert_eq!(ResourceNaming::to_param("post", "id"), "post_id");
    /// ```
    #[must_use]
    pub fn to_param(resource: &str, id_param: &str) -> String {
        format!("{resource}_{id_param}")
    }

    /// Whether `name` can be used verbatim as a path segment and identifier
    ///
    /// Accepts lowercase ASCII letters, digits and underscores, not starting
    /// with a digit.
    #[must_use]
    pub fn is_valid_identifier(name: &str) -> bool {
        let mut chars = name.chars();
        chars
            .next()
            .is_some_and(|first| first.is_ascii_lowercase() || first == '_')
            && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pluralize() {
        assert_eq!(ResourceNaming::pluralize("post"), "posts");
        assert_eq!(ResourceNaming::pluralize("comment"), "comments");
        assert_eq!(ResourceNaming::pluralize("category"), "categories");
    }

    #[test]
    fn test_singularize() {
        assert_eq!(ResourceNaming::singularize("posts"), "post");
        assert_eq!(ResourceNaming::singularize("comments"), "comment");
        assert_eq!(ResourceNaming::singularize("categories"), "category");
    }

    #[test]
    fn test_irregular_words() {
        assert_eq!(ResourceNaming::singularize("people"), "person");
        assert_eq!(ResourceNaming::pluralize("person"), "people");
        assert_eq!(ResourceNaming::pluralize("people"), "people");
        assert_eq!(ResourceNaming::singularize("data"), "datum");
        assert_eq!(ResourceNaming::singularize("children"), "child");
        assert_eq!(ResourceNaming::pluralize("sales_person"), "sales_people");
        assert_eq!(ResourceNaming::singularize("news"), "news");
        assert_eq!(ResourceNaming::pluralize("sheep"), "sheep");
        assert_eq!(ResourceNaming::singularize("line_items"), "line_item");
    }

    #[test]
    fn test_plural_segment() {
        assert_eq!(ResourceNaming::plural_segment("post"), "posts");
        assert_eq!(ResourceNaming::plural_segment("category"), "categories");
        assert_eq!(ResourceNaming::plural_segment("comments"), "comments");
        assert_eq!(ResourceNaming::plural_segment("people"), "people");
        assert_eq!(ResourceNaming::plural_segment("person"), "people");
        assert_eq!(ResourceNaming::plural_segment("data"), "data");
        assert_eq!(ResourceNaming::plural_segment("equipment"), "equipment");
    }

    #[test]
    fn test_resource_name_of_irregular_plurals() {
        assert_eq!(ResourceNaming::resource_name("People"), "person");
        assert_eq!(ResourceNaming::resource_name("Data"), "datum");
        assert_eq!(ResourceNaming::resource_name("Admin::ChildrenController"), "child");
    }

    #[test]
    fn test_segment_name_keeps_declared_number() {
        assert_eq!(ResourceNaming::segment_name("Settings"), "settings");
        assert_eq!(ResourceNaming::segment_name("posts/delete_confirmations"), "delete_confirmations");
        assert_eq!(ResourceNaming::segment_name("People"), "people");
        assert_eq!(ResourceNaming::segment_name("Controller"), "");
    }

    #[test]
    fn test_split_controller() {
        assert_eq!(
            ResourceNaming::split_controller("Admin::Posts::CommentsController"),
            (vec!["Admin", "Posts"], "Comments")
        );
        assert_eq!(
            ResourceNaming::split_controller("posts/comments_controller"),
            (vec!["posts"], "comments")
        );
        assert_eq!(ResourceNaming::split_controller("Posts"), (vec![], "Posts"));
        assert_eq!(ResourceNaming::split_controller(""), (vec![], ""));
    }

    #[test]
    fn test_resource_name() {
        assert_eq!(ResourceNaming::resource_name("Comments"), "comment");
        assert_eq!(ResourceNaming::resource_name("CommentsController"), "comment");
        assert_eq!(ResourceNaming::resource_name("posts"), "post");
        assert_eq!(
            ResourceNaming::resource_name("DeleteConfirmations"),
            "delete_confirmation"
        );
        assert_eq!(ResourceNaming::resource_name("Controller"), "");
    }

    #[test]
    fn test_parent_name() {
        assert_eq!(
            ResourceNaming::parent_name("Posts::CommentsController").as_deref(),
            Some("post")
        );
        assert_eq!(
            ResourceNaming::parent_name("blog/posts/comments").as_deref(),
            Some("post")
        );
        assert_eq!(ResourceNaming::parent_name("Comments"), None);
    }

    #[test]
    fn test_to_param() {
        assert_eq!(ResourceNaming::to_param("post", "id"), "post_id");
        assert_eq!(ResourceNaming::to_param("user_profile", "uuid"), "user_profile_uuid");
    }

    #[test]
    fn test_valid_identifier() {
        assert!(ResourceNaming::is_valid_identifier("post"));
        assert!(ResourceNaming::is_valid_identifier("delete_confirmation"));
        assert!(ResourceNaming::is_valid_identifier("v2_post"));
        assert!(!ResourceNaming::is_valid_identifier(""));
        assert!(!ResourceNaming::is_valid_identifier("2fa"));
        assert!(!ResourceNaming::is_valid_identifier("Post"));
        assert!(!ResourceNaming::is_valid_identifier("post-comment"));
        assert!(!ResourceNaming::is_valid_identifier("posts/:id"));
    }
}

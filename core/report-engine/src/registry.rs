//! FILENAME: core/report-engine/src/registry.rs
//! Process-wide report registration and URL derivation.
//!
//! The registry is constructed explicitly at application startup and
//! handed to whatever composes the URL surface; registration after
//! startup is the caller's concurrency problem (wrap it in a lock).

use crate::error::ReportError;
use crate::report::Report;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;

lazy_static! {
    /// Word boundary inside a camel-case name: a lowercase letter or
    /// digit immediately followed by an uppercase letter.
    static ref CAMEL_BOUNDARY: Regex =
        Regex::new("([a-z0-9])([A-Z])").expect("valid camel boundary pattern");
}

/// "MyFancyReport" -> "My fancy report".
pub fn camel_to_title(name: &str) -> String {
    let spaced = CAMEL_BOUNDARY.replace_all(name, "$1 $2").to_string();
    let lowered = spaced.to_lowercase();
    let mut chars = lowered.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => lowered,
    }
}

/// "MyFancyReport" -> "my_fancy_report".
pub fn camel_to_snake(name: &str) -> String {
    CAMEL_BOUNDARY
        .replace_all(name, "${1}_${2}")
        .to_string()
        .to_lowercase()
}

/// One route derived from a registered report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportUrl {
    /// Path segment, e.g. `my_app/myfancyreport/`.
    pub path: String,
    /// Route name, e.g. `my_fancy_report`.
    pub name: String,
}

type ReportFactory = Arc<dyn Fn() -> Report + Send + Sync>;

/// One registered report: its owning app, its type name and a factory
/// building a fresh per-request instance.
#[derive(Clone)]
pub struct ReportEntry {
    pub app: String,
    pub name: String,
    factory: ReportFactory,
}

impl ReportEntry {
    pub fn new<F>(app: &str, name: &str, factory: F) -> Self
    where
        F: Fn() -> Report + Send + Sync + 'static,
    {
        ReportEntry {
            app: app.to_string(),
            name: name.to_string(),
            factory: Arc::new(factory),
        }
    }

    /// Builds a fresh report instance for one request.
    pub fn build(&self) -> Report {
        (self.factory)()
    }

    fn url(&self) -> ReportUrl {
        ReportUrl {
            path: format!("{}/{}/", self.app.replace('.', "_"), self.name.to_lowercase()),
            name: camel_to_snake(&self.name),
        }
    }
}

/// Ordered name -> factory table for the reports of one site.
pub struct ReportRegistry {
    name: String,
    entries: Vec<ReportEntry>,
}

impl ReportRegistry {
    pub fn new(name: &str) -> Self {
        ReportRegistry {
            name: name.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a report; fails if one with the same name is present.
    pub fn register(&mut self, entry: ReportEntry) -> Result<(), ReportError> {
        if self.entries.iter().any(|e| e.name == entry.name) {
            return Err(ReportError::AlreadyRegistered(entry.name));
        }
        debug!("registering report {} under {}", entry.name, self.name);
        self.entries.push(entry);
        Ok(())
    }

    /// Registers a source type under its own type name, with a
    /// `Default`-built instance per request.
    pub fn register_default<S>(&mut self, app: &str) -> Result<(), ReportError>
    where
        S: crate::report::ReportSource + Default + 'static,
    {
        let name = std::any::type_name::<S>()
            .rsplit("::")
            .next()
            .unwrap_or("Report");
        self.register(ReportEntry::new(app, name, || Report::new(S::default())))
    }

    /// Removes a report by name; fails if absent.
    pub fn unregister(&mut self, name: &str) -> Result<(), ReportError> {
        match self.entries.iter().position(|e| e.name == name) {
            Some(index) => {
                self.entries.remove(index);
                Ok(())
            }
            None => Err(ReportError::NotRegistered(name.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    /// One URL per registered report, in registration order.
    pub fn get_urls(&self) -> Vec<ReportUrl> {
        self.entries.iter().map(ReportEntry::url).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportSource;

    struct MyFancyReport;
    impl ReportSource for MyFancyReport {}

    fn entry() -> ReportEntry {
        ReportEntry::new("my_app", "MyFancyReport", || Report::new(MyFancyReport))
    }

    #[test]
    fn test_camel_splitting() {
        assert_eq!(camel_to_title("MyFancyReport"), "My fancy report");
        assert_eq!(camel_to_snake("MyFancyReport"), "my_fancy_report");
        assert_eq!(camel_to_snake("Report2Csv"), "report2_csv");
    }

    #[test]
    fn test_register_and_urls() {
        let mut registry = ReportRegistry::new("admin_reports");
        registry.register(entry()).unwrap();
        let urls = registry.get_urls();
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].path, "my_app/myfancyreport/");
        assert_eq!(urls[0].name, "my_fancy_report");
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = ReportRegistry::new("admin_reports");
        registry.register(entry()).unwrap();
        assert!(matches!(
            registry.register(entry()),
            Err(ReportError::AlreadyRegistered(_))
        ));
    }

    #[test]
    fn test_unregister_unknown_fails() {
        let mut registry = ReportRegistry::new("admin_reports");
        assert!(matches!(
            registry.unregister("Nope"),
            Err(ReportError::NotRegistered(_))
        ));
        registry.register(entry()).unwrap();
        registry.unregister("MyFancyReport").unwrap();
        assert!(registry.get("MyFancyReport").is_none());
    }

    #[test]
    fn test_register_default_uses_type_name() {
        #[derive(Default)]
        struct WeeklySales;
        impl ReportSource for WeeklySales {}
        let mut registry = ReportRegistry::new("admin_reports");
        registry.register_default::<WeeklySales>("shop").unwrap();
        let urls = registry.get_urls();
        assert_eq!(urls[0].path, "shop/weeklysales/");
        assert_eq!(urls[0].name, "weekly_sales");
    }

    #[test]
    fn test_dotted_app_path() {
        let e = ReportEntry::new("my.nested.app", "SalesReport", || {
            Report::new(MyFancyReport)
        });
        assert_eq!(e.url().path, "my_nested_app/salesreport/");
    }
}

//! The endpoint catalog.
//!
//! Every endpoint the client may call is a variant of [`Endpoint`]. String
//! lookups through [`resolve`] are validated against that closed set, so a
//! typo is a CONFIG error rather than a request to a bogus URL.

use crm_api_core::ApiError;
use std::fmt;
use std::str::FromStr;

/// Top-level grouping of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Analytics,
    Billing,
    Accounts,
    Invoices,
    Customers,
    Subscriptions,
    Crm,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Analytics,
        Category::Billing,
        Category::Accounts,
        Category::Invoices,
        Category::Customers,
        Category::Subscriptions,
        Category::Crm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Analytics => "analytics",
            Category::Billing => "billing",
            Category::Accounts => "accounts",
            Category::Invoices => "invoices",
            Category::Customers => "customers",
            Category::Subscriptions => "subscriptions",
            Category::Crm => "crm",
        }
    }

    /// Endpoints filed under this category.
    pub fn endpoints(self) -> impl Iterator<Item = Endpoint> {
        Endpoint::ALL.into_iter().filter(move |e| e.category() == self)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ApiError::config(format!("Unknown endpoint category: {s}")))
    }
}

/// Primary path and optional fallback path for one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointDescriptor {
    pub primary: &'static str,
    pub fallback: Option<&'static str>,
}

/// Every endpoint in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    AnalyticsUsage,
    BillingPayments,
    BillingPaymentsList,
    AccountsProfile,
    InvoicesList,
    InvoiceItems,
    InvoiceCustomers,
    InvoicesCreate,
    CustomersList,
    CustomersCreate,
    SubscriptionsList,
    CrmLeads,
    CrmClients,
    CrmDashboard,
}

impl Endpoint {
    pub const ALL: [Endpoint; 14] = [
        Endpoint::AnalyticsUsage,
        Endpoint::BillingPayments,
        Endpoint::BillingPaymentsList,
        Endpoint::AccountsProfile,
        Endpoint::InvoicesList,
        Endpoint::InvoiceItems,
        Endpoint::InvoiceCustomers,
        Endpoint::InvoicesCreate,
        Endpoint::CustomersList,
        Endpoint::CustomersCreate,
        Endpoint::SubscriptionsList,
        Endpoint::CrmLeads,
        Endpoint::CrmClients,
        Endpoint::CrmDashboard,
    ];

    pub fn category(&self) -> Category {
        match self {
            Endpoint::AnalyticsUsage => Category::Analytics,
            Endpoint::BillingPayments | Endpoint::BillingPaymentsList => Category::Billing,
            Endpoint::AccountsProfile => Category::Accounts,
            Endpoint::InvoicesList
            | Endpoint::InvoiceItems
            | Endpoint::InvoiceCustomers
            | Endpoint::InvoicesCreate => Category::Invoices,
            Endpoint::CustomersList | Endpoint::CustomersCreate => Category::Customers,
            Endpoint::SubscriptionsList => Category::Subscriptions,
            Endpoint::CrmLeads | Endpoint::CrmClients | Endpoint::CrmDashboard => Category::Crm,
        }
    }

    /// Name within the category, as used in string lookups.
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::AnalyticsUsage => "usage",
            Endpoint::BillingPayments => "payments",
            Endpoint::BillingPaymentsList => "paymentsList",
            Endpoint::AccountsProfile => "profile",
            Endpoint::InvoicesList | Endpoint::CustomersList | Endpoint::SubscriptionsList => {
                "list"
            }
            Endpoint::InvoiceItems => "items",
            Endpoint::InvoiceCustomers => "customers",
            Endpoint::InvoicesCreate | Endpoint::CustomersCreate => "create",
            Endpoint::CrmLeads => "leads",
            Endpoint::CrmClients => "clients",
            Endpoint::CrmDashboard => "dashboard",
        }
    }

    pub fn descriptor(&self) -> EndpointDescriptor {
        let (primary, fallback) = match self {
            Endpoint::AnalyticsUsage => ("/analytics/usage/", Some("/api/analytics/usage/")),
            Endpoint::BillingPayments => {
                ("/billing/api/payments/", Some("/payments/api/payments/"))
            }
            Endpoint::BillingPaymentsList => ("/api/billing/payments/", None),
            Endpoint::AccountsProfile => ("/api/accounts/profile/", Some("/accounts/profile/")),
            Endpoint::InvoicesList => ("/api/invoices/", Some("/invoices/")),
            Endpoint::InvoiceItems => ("/api/invoice-items/", Some("/invoice-items/")),
            Endpoint::InvoiceCustomers => {
                ("/api/invoices/customers/", Some("/invoices/customers/"))
            }
            Endpoint::InvoicesCreate => ("/api/invoices/invoices/", None),
            Endpoint::CustomersList => ("/api/customers/", Some("/customers/")),
            Endpoint::CustomersCreate => ("/api/customers/", Some("/customers/")),
            Endpoint::SubscriptionsList => ("/api/subscription/", Some("/subscription/")),
            Endpoint::CrmLeads => ("/api/crm/leads/", Some("/crm/leads/")),
            Endpoint::CrmClients => ("/api/crm/clients/", Some("/crm/clients/")),
            Endpoint::CrmDashboard => ("/api/crm/dashboard/", Some("/crm/dashboard/")),
        };
        EndpointDescriptor { primary, fallback }
    }

    /// Looks up `category`/`name`.
    pub fn lookup(category: &str, name: &str) -> Result<Endpoint, ApiError> {
        let category: Category = category.parse()?;
        category
            .endpoints()
            .find(|e| e.name() == name)
            .ok_or_else(|| ApiError::config(format!("Unknown endpoint: {category}.{name}")))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.category(), self.name())
    }
}

/// Resolves `category`/`name` to its paths.
///
/// An unknown category or an unknown name within a known category is a
/// CONFIG error.
///
/// ```
/// use crm_api_endpoints::resolve;
///
/// let leads = resolve("crm", "leads").unwrap();
/// assert_eq!(leads.primary, "/api/crm/leads/");
/// assert_eq!(leads.fallback, Some("/crm/leads/"));
///
/// assert!(resolve("nope", "leads").unwrap_err().is_config());
/// ```
pub fn resolve(category: &str, name: &str) -> Result<EndpointDescriptor, ApiError> {
    Endpoint::lookup(category, name).map(|e| e.descriptor())
}

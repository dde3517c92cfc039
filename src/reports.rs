//! The ten analytical reports and the runner that executes them.
//!
//! Every report reads only base tables, so steps are independent and can be
//! run in any order. Filter thresholds are bound as statement parameters.

use crate::core::db::QueryExecutor;
use crate::core::{ReportError, Result};
use crate::integrity::{self, DataIntegrityWarning};
use crate::table::{materialize, Table};
use rusqlite::{params, Connection, Params};
use serde::Deserialize;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Customers' average credit limit an employee must exceed in step 6
pub const DEFAULT_MIN_AVERAGE_CREDIT_LIMIT: f64 = 90000.0;
/// How many employees step 6 keeps
pub const DEFAULT_TOP_EMPLOYEES: u32 = 4;
/// A product bought by fewer distinct customers than this is low-demand
pub const DEFAULT_LOW_DEMAND_CUSTOMER_CUTOFF: u32 = 20;

/// Tunable filter constants shared by the reports.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportThresholds {
    pub min_average_credit_limit: f64,
    pub top_employees: u32,
    pub low_demand_customer_cutoff: u32,
}

impl Default for ReportThresholds {
    fn default() -> Self {
        ReportThresholds {
            min_average_credit_limit: DEFAULT_MIN_AVERAGE_CREDIT_LIMIT,
            top_employees: DEFAULT_TOP_EMPLOYEES,
            low_demand_customer_cutoff: DEFAULT_LOW_DEMAND_CUSTOMER_CUTOFF,
        }
    }
}

impl ReportThresholds {
    /// Rejects thresholds that cannot be bound meaningfully.
    pub fn validate(&self) -> Result<()> {
        if !self.min_average_credit_limit.is_finite() {
            return Err(ReportError::Config(format!(
                "min_average_credit_limit must be a finite number, got {}",
                self.min_average_credit_limit
            )));
        }
        Ok(())
    }
}

/// The reports, in the order a full run executes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportStep {
    BostonEmployees,
    OfficesWithoutEmployees,
    EmployeeOffices,
    CustomersWithoutOrders,
    PaymentReport,
    TopCreditEmployees,
    ProductSales,
    ProductReach,
    OfficeCustomerCounts,
    LowDemandSellers,
}

impl ReportStep {
    pub const ALL: [ReportStep; 10] = [
        ReportStep::BostonEmployees,
        ReportStep::OfficesWithoutEmployees,
        ReportStep::EmployeeOffices,
        ReportStep::CustomersWithoutOrders,
        ReportStep::PaymentReport,
        ReportStep::TopCreditEmployees,
        ReportStep::ProductSales,
        ReportStep::ProductReach,
        ReportStep::OfficeCustomerCounts,
        ReportStep::LowDemandSellers,
    ];

    /// 1-based position in a full run
    pub fn number(self) -> usize {
        match self {
            ReportStep::BostonEmployees => 1,
            ReportStep::OfficesWithoutEmployees => 2,
            ReportStep::EmployeeOffices => 3,
            ReportStep::CustomersWithoutOrders => 4,
            ReportStep::PaymentReport => 5,
            ReportStep::TopCreditEmployees => 6,
            ReportStep::ProductSales => 7,
            ReportStep::ProductReach => 8,
            ReportStep::OfficeCustomerCounts => 9,
            ReportStep::LowDemandSellers => 10,
        }
    }

    pub fn from_number(number: usize) -> Option<Self> {
        number
            .checked_sub(1)
            .and_then(|i| ReportStep::ALL.get(i).copied())
    }

    pub fn title(self) -> &'static str {
        match self {
            ReportStep::BostonEmployees => "Employees in the Boston office",
            ReportStep::OfficesWithoutEmployees => "Offices with no employees",
            ReportStep::EmployeeOffices => "Employees and their office location",
            ReportStep::CustomersWithoutOrders => "Customers who never ordered",
            ReportStep::PaymentReport => "Customer payments by amount",
            ReportStep::TopCreditEmployees => "Top employees by high-credit customers",
            ReportStep::ProductSales => "Best-selling products",
            ReportStep::ProductReach => "Distinct purchasers per product",
            ReportStep::OfficeCustomerCounts => "Customers per office",
            ReportStep::LowDemandSellers => "Employees who sold low-demand products",
        }
    }

    /// Whether the report defines its row order. Unordered results must be
    /// compared as sets.
    pub fn is_ordered(self) -> bool {
        !matches!(
            self,
            ReportStep::BostonEmployees
                | ReportStep::OfficesWithoutEmployees
                | ReportStep::OfficeCustomerCounts
        )
    }
}

impl fmt::Display for ReportStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step {}: {}", self.number(), self.title())
    }
}

const BOSTON_EMPLOYEES_SQL: &str = "
    SELECT e.firstName, e.lastName
    FROM employees e
    JOIN offices o ON e.officeCode = o.officeCode
    WHERE o.city = 'Boston'";

const OFFICES_WITHOUT_EMPLOYEES_SQL: &str = "
    SELECT o.officeCode, o.city, o.state, o.country
    FROM offices o
    LEFT JOIN employees e ON o.officeCode = e.officeCode
    WHERE e.employeeNumber IS NULL";

const EMPLOYEE_OFFICES_SQL: &str = "
    SELECT e.firstName, e.lastName, o.city, o.state
    FROM employees e
    LEFT JOIN offices o ON e.officeCode = o.officeCode
    ORDER BY e.firstName, e.lastName, e.employeeNumber";

const CUSTOMERS_WITHOUT_ORDERS_SQL: &str = "
    SELECT c.contactFirstName, c.contactLastName, c.phone, c.salesRepEmployeeNumber
    FROM customers c
    LEFT JOIN orders o ON c.customerNumber = o.customerNumber
    WHERE o.orderNumber IS NULL
    ORDER BY c.contactLastName, c.contactFirstName";

// rowid keeps equal amounts in insertion order.
const PAYMENT_REPORT_SQL: &str = "
    SELECT c.contactFirstName, c.contactLastName, p.amount, p.paymentDate
    FROM customers c
    JOIN payments p ON c.customerNumber = p.customerNumber
    ORDER BY CAST(p.amount AS REAL) DESC, p.rowid";

const TOP_CREDIT_EMPLOYEES_SQL: &str = "
    SELECT e.employeeNumber, e.firstName, e.lastName,
           COUNT(c.customerNumber) AS num_customers
    FROM employees e
    JOIN customers c ON e.employeeNumber = c.salesRepEmployeeNumber
    GROUP BY e.employeeNumber, e.firstName, e.lastName
    HAVING AVG(c.creditLimit) > ?1
    ORDER BY num_customers DESC, e.employeeNumber
    LIMIT ?2";

const PRODUCT_SALES_SQL: &str = "
    SELECT p.productName,
           COUNT(od.productCode) AS numorders,
           SUM(od.quantityOrdered) AS totalunits
    FROM products p
    JOIN orderdetails od ON p.productCode = od.productCode
    GROUP BY p.productName
    ORDER BY totalunits DESC, p.productName";

const PRODUCT_REACH_SQL: &str = "
    SELECT p.productName, p.productCode,
           COUNT(DISTINCT o.customerNumber) AS numpurchasers
    FROM products p
    JOIN orderdetails od ON p.productCode = od.productCode
    JOIN orders o ON od.orderNumber = o.orderNumber
    GROUP BY p.productName, p.productCode
    ORDER BY numpurchasers DESC, p.productCode";

const OFFICE_CUSTOMER_COUNTS_SQL: &str = "
    SELECT o.officeCode, o.city, COUNT(c.customerNumber) AS n_customers
    FROM offices o
    JOIN employees e ON o.officeCode = e.officeCode
    JOIN customers c ON e.employeeNumber = c.salesRepEmployeeNumber
    GROUP BY o.officeCode, o.city";

macro_rules! low_demand_products_sql {
    () => {
        "
        SELECT od.productCode, COUNT(DISTINCT o.customerNumber) AS numpurchasers
        FROM orderdetails od
        JOIN orders o ON od.orderNumber = o.orderNumber
        GROUP BY od.productCode
        HAVING COUNT(DISTINCT o.customerNumber) < ?1"
    };
}

const LOW_DEMAND_PRODUCTS_SQL: &str =
    concat!(low_demand_products_sql!(), "\n        ORDER BY od.productCode");

const LOW_DEMAND_SELLERS_SQL: &str = concat!(
    "
    WITH low_demand_products AS (",
    low_demand_products_sql!(),
    "
    )
    SELECT DISTINCT e.employeeNumber, e.firstName, e.lastName, ofc.city, ofc.officeCode
    FROM employees e
    JOIN offices ofc ON e.officeCode = ofc.officeCode
    JOIN customers c ON e.employeeNumber = c.salesRepEmployeeNumber
    JOIN orders o ON c.customerNumber = o.customerNumber
    JOIN orderdetails od ON o.orderNumber = od.orderNumber
    WHERE od.productCode IN (SELECT productCode FROM low_demand_products)
    ORDER BY e.lastName, e.firstName, e.employeeNumber"
);

/// Runs the reports against one open connection.
pub struct QueryRunner<'a> {
    connection: &'a Connection,
    thresholds: ReportThresholds,
}

impl<'a> QueryRunner<'a> {
    /// Creates a runner with the default thresholds
    pub fn new(connection: &'a Connection) -> Self {
        Self::with_thresholds(connection, ReportThresholds::default())
    }

    pub fn with_thresholds(connection: &'a Connection, thresholds: ReportThresholds) -> Self {
        QueryRunner {
            connection,
            thresholds,
        }
    }

    fn query<P: Params>(&self, sql: &str, params: P) -> Result<Table> {
        let raw = QueryExecutor::new(self.connection).execute(sql, params)?;
        materialize(raw)
    }

    /// Step 1: first and last name of every employee in the Boston office.
    pub fn boston_employees(&self) -> Result<Table> {
        self.query(BOSTON_EMPLOYEES_SQL, [])
    }

    /// Step 2: offices no employee references.
    pub fn offices_without_employees(&self) -> Result<Table> {
        self.query(OFFICES_WITHOUT_EMPLOYEES_SQL, [])
    }

    /// Step 3: every employee with the city and state of their office, if any.
    pub fn employee_offices(&self) -> Result<Table> {
        self.query(EMPLOYEE_OFFICES_SQL, [])
    }

    /// Step 4: contacts of customers with no orders, by contact last name.
    pub fn customers_without_orders(&self) -> Result<Table> {
        self.query(CUSTOMERS_WITHOUT_ORDERS_SQL, [])
    }

    /// Step 5: payments with their customer contact, largest amount first.
    ///
    /// The amount is ordered numerically but returned exactly as stored.
    pub fn payment_report(&self) -> Result<Table> {
        self.query(PAYMENT_REPORT_SQL, [])
    }

    /// Step 6: employees whose customers' average credit limit exceeds the
    /// threshold, by number of customers.
    pub fn top_credit_employees(&self) -> Result<Table> {
        self.query(
            TOP_CREDIT_EMPLOYEES_SQL,
            params![
                self.thresholds.min_average_credit_limit,
                i64::from(self.thresholds.top_employees)
            ],
        )
    }

    /// Step 7: order lines and total units per product.
    pub fn product_sales(&self) -> Result<Table> {
        self.query(PRODUCT_SALES_SQL, [])
    }

    /// Step 8: distinct purchasing customers per product.
    pub fn product_reach(&self) -> Result<Table> {
        self.query(PRODUCT_REACH_SQL, [])
    }

    /// Step 9: customers served through each office's employees.
    pub fn office_customer_counts(&self) -> Result<Table> {
        self.query(OFFICE_CUSTOMER_COUNTS_SQL, [])
    }

    /// Products bought by fewer distinct customers than the cutoff.
    pub fn low_demand_products(&self) -> Result<Table> {
        self.query(
            LOW_DEMAND_PRODUCTS_SQL,
            [i64::from(self.thresholds.low_demand_customer_cutoff)],
        )
    }

    /// Step 10: employees who sold at least one low-demand product.
    pub fn low_demand_sellers(&self) -> Result<Table> {
        self.query(
            LOW_DEMAND_SELLERS_SQL,
            [i64::from(self.thresholds.low_demand_customer_cutoff)],
        )
    }

    /// Runs a single report.
    pub fn run(&self, step: ReportStep) -> Result<Table> {
        match step {
            ReportStep::BostonEmployees => self.boston_employees(),
            ReportStep::OfficesWithoutEmployees => self.offices_without_employees(),
            ReportStep::EmployeeOffices => self.employee_offices(),
            ReportStep::CustomersWithoutOrders => self.customers_without_orders(),
            ReportStep::PaymentReport => self.payment_report(),
            ReportStep::TopCreditEmployees => self.top_credit_employees(),
            ReportStep::ProductSales => self.product_sales(),
            ReportStep::ProductReach => self.product_reach(),
            ReportStep::OfficeCustomerCounts => self.office_customer_counts(),
            ReportStep::LowDemandSellers => self.low_demand_sellers(),
        }
    }

    /// Runs one report and gathers its data-integrity warnings.
    pub fn run_step(&self, step: ReportStep) -> StepReport {
        let started = Instant::now();
        let outcome = self.run(step);
        let elapsed = started.elapsed();

        match &outcome {
            Ok(table) => info!(
                step = step.number(),
                rows = table.row_count(),
                elapsed_ms = elapsed.as_millis() as u64,
                "{}",
                step.title()
            ),
            Err(e) => warn!(step = step.number(), "{} failed: {}", step.title(), e),
        }

        let warnings = match integrity::warnings_for(self.connection, step) {
            Ok(warnings) => warnings,
            Err(e) => {
                debug!(step = step.number(), "Integrity check skipped: {}", e);
                Vec::new()
            }
        };
        for warning in &warnings {
            warn!(step = step.number(), "{}", warning);
        }

        StepReport {
            step,
            outcome,
            warnings,
            elapsed,
        }
    }

    /// Runs every report in order. A failing step does not stop the others.
    pub fn run_all(&self) -> Vec<StepReport> {
        ReportStep::ALL.iter().map(|&step| self.run_step(step)).collect()
    }
}

/// The outcome of one report within a run.
#[derive(Debug)]
pub struct StepReport {
    pub step: ReportStep,
    pub outcome: Result<Table>,
    pub warnings: Vec<DataIntegrityWarning>,
    pub elapsed: Duration,
}

impl StepReport {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn table(&self) -> Option<&Table> {
        self.outcome.as_ref().ok()
    }
}

//! # Test Utilities Module
//!
//! Builds databases shaped like the classic-models sample for unit tests,
//! integration tests, and property tests:
//! - the seven report tables, with the column names the reports use
//! - a small, hand-checked sample data set
//! - insert helpers for generated fixtures

use crate::core::Result;
use rusqlite::{params, Connection};
use std::path::Path;

const SCHEMA_SQL: &str = "
    CREATE TABLE offices (
        officeCode TEXT PRIMARY KEY,
        city TEXT NOT NULL,
        phone TEXT,
        state TEXT,
        country TEXT NOT NULL
    );
    CREATE TABLE employees (
        employeeNumber INTEGER PRIMARY KEY,
        lastName TEXT NOT NULL,
        firstName TEXT NOT NULL,
        officeCode TEXT,
        jobTitle TEXT
    );
    CREATE TABLE customers (
        customerNumber INTEGER PRIMARY KEY,
        customerName TEXT,
        contactLastName TEXT NOT NULL,
        contactFirstName TEXT NOT NULL,
        phone TEXT,
        salesRepEmployeeNumber INTEGER,
        creditLimit REAL
    );
    CREATE TABLE orders (
        orderNumber INTEGER PRIMARY KEY,
        customerNumber INTEGER NOT NULL,
        orderDate TEXT,
        status TEXT
    );
    CREATE TABLE orderdetails (
        orderNumber INTEGER NOT NULL,
        productCode TEXT NOT NULL,
        quantityOrdered INTEGER NOT NULL,
        priceEach REAL,
        PRIMARY KEY (orderNumber, productCode)
    );
    CREATE TABLE products (
        productCode TEXT PRIMARY KEY,
        productName TEXT NOT NULL
    );
    CREATE TABLE payments (
        customerNumber INTEGER NOT NULL,
        checkNumber TEXT NOT NULL,
        paymentDate TEXT,
        amount TEXT,
        PRIMARY KEY (customerNumber, checkNumber)
    );
";

// Expected report results for this data are spelled out in the tests.
const SAMPLE_DATA_SQL: &str = "
    INSERT INTO offices (officeCode, city, state, country) VALUES
        ('1', 'Boston', 'MA', 'USA'),
        ('2', 'Paris', NULL, 'France'),
        ('3', 'Tokyo', 'Chiyoda-Ku', 'Japan'),
        ('4', 'Sydney', 'NSW', 'Australia'),
        ('5', 'London', NULL, 'UK');

    INSERT INTO employees (employeeNumber, lastName, firstName, officeCode) VALUES
        (1002, 'Murphy', 'Diane', '1'),
        (1056, 'Patterson', 'Mary', '1'),
        (1102, 'Bondur', 'Gerard', '2'),
        (1165, 'Jennings', 'Leslie', '3'),
        (1188, 'Firrelli', 'Julie', '2'),
        (1702, 'Martin', 'Gerard', '9');

    INSERT INTO customers (customerNumber, contactLastName, contactFirstName, phone,
                           salesRepEmployeeNumber, creditLimit) VALUES
        (101, 'King', 'Jean', '7025551838', 1002, 100000.0),
        (102, 'Schmitt', 'Carine', '40.32.2555', 1002, 120000.0),
        (103, 'Ferguson', 'Peter', '03 9520 4555', 1002, 95000.0),
        (104, 'Labrune', 'Janine', '40.67.8555', 1056, 50000.0),
        (105, 'Bergulfsen', 'Jonas', '07-98 9555', 1056, 60000.0),
        (106, 'Nelson', 'Susan', '4155551450', 1102, 91000.0),
        (107, 'Piestrzeniewicz', 'Zbyszek', '(26) 642-7555', 1102, 92000.0),
        (108, 'Keitel', 'Roland', '+49 69 66 90 2555', 1165, 150000.0),
        (109, 'Murphy', 'Julie', '6505555787', 1188, 90000.0),
        (110, 'Lee', 'Kwai', '2125557413', NULL, 0.0),
        (111, 'Freyre', 'Diego', '(91) 555 94 44', 1056, 40000.0);

    INSERT INTO orders (orderNumber, customerNumber, orderDate, status) VALUES
        (10100, 101, '2003-01-06', 'Shipped'),
        (10101, 102, '2003-01-09', 'Shipped'),
        (10102, 103, '2003-01-10', 'Shipped'),
        (10103, 104, '2003-01-29', 'Shipped'),
        (10104, 106, '2003-01-31', 'Shipped'),
        (10105, 108, '2003-02-11', 'Shipped'),
        (10106, 101, '2003-02-17', 'Shipped'),
        (10107, 109, '2003-02-24', 'Shipped');

    INSERT INTO products (productCode, productName) VALUES
        ('S10_1678', '1969 Harley Davidson Ultimate Chopper'),
        ('S10_1949', '1952 Alpine Renault 1300'),
        ('S12_1099', '1968 Ford Mustang'),
        ('S18_1749', '1917 Grand Touring Sedan');

    INSERT INTO orderdetails (orderNumber, productCode, quantityOrdered, priceEach) VALUES
        (10100, 'S10_1678', 30, 95.70),
        (10100, 'S10_1949', 20, 214.30),
        (10101, 'S10_1678', 25, 81.35),
        (10102, 'S12_1099', 10, 161.49),
        (10103, 'S10_1678', 40, 86.13),
        (10104, 'S12_1099', 6, 170.00),
        (10105, 'S12_1099', 12, 165.10),
        (10105, 'S10_1678', 7, 90.92),
        (10106, 'S10_1678', 5, 94.74),
        (10107, 'S10_1949', 9, 205.72);

    INSERT INTO payments (customerNumber, checkNumber, paymentDate, amount) VALUES
        (101, 'HQ336336', '2004-10-19', '6066.78'),
        (101, 'JM555205', '2003-06-05', '14571.44'),
        (102, 'OM314933', '2004-12-18', '1676.14'),
        (103, 'BO864823', '2004-12-17', '14191.12'),
        (104, 'HQ55022', '2003-06-06', '32641.98'),
        (106, 'ID10962', '2004-12-31', '116208.40'),
        (108, 'KI131716', '2003-08-15', '1676.14');
";

/// A writable database with the report schema
pub struct DatabaseFixture {
    pub connection: Connection,
}

impl DatabaseFixture {
    /// Creates an in-memory database with the report tables and no rows
    pub fn new() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Creates an in-memory database populated with the sample data
    pub fn with_sample_data() -> Result<Self> {
        let fixture = Self::new()?;
        fixture.connection.execute_batch(SAMPLE_DATA_SQL)?;
        Ok(fixture)
    }

    /// Writes the sample database to `path` and closes it, for tests that
    /// need a real file to open read-only
    pub fn write_sample_database<P: AsRef<Path>>(path: P) -> Result<()> {
        let fixture = Self::from_connection(Connection::open(path)?)?;
        fixture.connection.execute_batch(SAMPLE_DATA_SQL)?;
        fixture.connection.close().map_err(|(_, e)| e)?;
        Ok(())
    }

    fn from_connection(connection: Connection) -> Result<Self> {
        connection.execute_batch(SCHEMA_SQL)?;
        Ok(DatabaseFixture { connection })
    }

    pub fn insert_office(&self, office_code: &str, city: &str) -> Result<()> {
        self.connection.execute(
            "INSERT INTO offices (officeCode, city, country) VALUES (?1, ?2, 'USA')",
            params![office_code, city],
        )?;
        Ok(())
    }

    pub fn insert_employee(
        &self,
        employee_number: i64,
        first_name: &str,
        last_name: &str,
        office_code: &str,
    ) -> Result<()> {
        self.connection.execute(
            "INSERT INTO employees (employeeNumber, firstName, lastName, officeCode)
             VALUES (?1, ?2, ?3, ?4)",
            params![employee_number, first_name, last_name, office_code],
        )?;
        Ok(())
    }

    pub fn insert_customer(
        &self,
        customer_number: i64,
        contact_last_name: &str,
        sales_rep: Option<i64>,
        credit_limit: f64,
    ) -> Result<()> {
        self.connection.execute(
            "INSERT INTO customers (customerNumber, contactLastName, contactFirstName,
                                    salesRepEmployeeNumber, creditLimit)
             VALUES (?1, ?2, 'Contact', ?3, ?4)",
            params![customer_number, contact_last_name, sales_rep, credit_limit],
        )?;
        Ok(())
    }

    pub fn insert_order(&self, order_number: i64, customer_number: i64) -> Result<()> {
        self.connection.execute(
            "INSERT INTO orders (orderNumber, customerNumber) VALUES (?1, ?2)",
            params![order_number, customer_number],
        )?;
        Ok(())
    }

    pub fn insert_product(&self, product_code: &str, product_name: &str) -> Result<()> {
        self.connection.execute(
            "INSERT INTO products (productCode, productName) VALUES (?1, ?2)",
            params![product_code, product_name],
        )?;
        Ok(())
    }

    pub fn insert_order_detail(
        &self,
        order_number: i64,
        product_code: &str,
        quantity: i64,
    ) -> Result<()> {
        self.connection.execute(
            "INSERT INTO orderdetails (orderNumber, productCode, quantityOrdered)
             VALUES (?1, ?2, ?3)",
            params![order_number, product_code, quantity],
        )?;
        Ok(())
    }

    pub fn insert_payment(
        &self,
        customer_number: i64,
        check_number: &str,
        payment_date: &str,
        amount: &str,
    ) -> Result<()> {
        self.connection.execute(
            "INSERT INTO payments (customerNumber, checkNumber, paymentDate, amount)
             VALUES (?1, ?2, ?3, ?4)",
            params![customer_number, check_number, payment_date, amount],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::missing_contract_columns;

    #[test]
    fn test_fixture_satisfies_report_contract() {
        let fixture = DatabaseFixture::new().unwrap();
        assert!(missing_contract_columns(&fixture.connection).unwrap().is_empty());
    }

    #[test]
    fn test_sample_row_counts() {
        let fixture = DatabaseFixture::with_sample_data().unwrap();
        let count = |table: &str| -> i64 {
            fixture
                .connection
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })
                .unwrap()
        };
        assert_eq!(count("offices"), 5);
        assert_eq!(count("employees"), 6);
        assert_eq!(count("customers"), 11);
        assert_eq!(count("payments"), 7);
    }
}

use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::{format_cents, Cents, Customer, Ledger, Product, Sale};

/// Default file name of the text report.
pub const DEFAULT_REPORT_PATH: &str = "estoque.txt";

/// Currency as written in the report, e.g. "R$7.50".
pub fn format_currency(cents: Cents) -> String {
    format!("R${}", format_cents(cents))
}

pub fn product_line(product: &Product) -> String {
    format!(
        "ID: {} | Nome: {} | Quantidade: {} | Preço: {}",
        product.id,
        product.name,
        product.quantity,
        format_currency(product.unit_price_cents)
    )
}

pub fn customer_line(customer: &Customer) -> String {
    format!(
        "ID Cliente: {} | Nome: {} | Total Gasto: {}",
        customer.id,
        customer.name,
        format_currency(customer.total_spent_cents)
    )
}

pub fn sale_line(sale: &Sale) -> String {
    format!(
        "Venda {} | Produto: {} (ID {}) | Cliente: {} (ID {}) | Qtd: {} | Valor: {}",
        sale.id,
        sale.product_name,
        sale.product_id,
        sale.customer_name,
        sale.customer_id,
        sale.quantity,
        format_currency(sale.amount_cents)
    )
}

/// Render the full text report: products, customers, sales history
/// (oldest first) and the two summary totals.
pub fn render_report(ledger: &Ledger) -> String {
    let mut out = String::from("==== PRODUTOS ====\n");
    for product in ledger.list_products() {
        push_line(&mut out, &product_line(product));
    }

    out.push_str("\n==== CLIENTES ====\n");
    for customer in ledger.customers_with_spend() {
        push_line(&mut out, &customer_line(customer));
    }

    out.push_str("\n==== VENDAS ====\n");
    for sale in ledger.history() {
        push_line(&mut out, &sale_line(sale));
    }

    out.push_str(&format!(
        "\nValor total do estoque: {}\n",
        format_currency(ledger.total_stock_value())
    ));
    out.push_str(&format!(
        "Valor total de vendas: {}\n",
        format_currency(ledger.total_sales_value())
    ));

    out
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

/// Write the text report to `path`, replacing any previous report.
pub fn write_report(ledger: &Ledger, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, render_report(ledger))
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report() {
        let report = render_report(&Ledger::new());
        assert_eq!(
            report,
            "==== PRODUTOS ====\n\
             \n==== CLIENTES ====\n\
             \n==== VENDAS ====\n\
             \nValor total do estoque: R$0.00\n\
             Valor total de vendas: R$0.00\n"
        );
    }

    #[test]
    fn test_report_layout() {
        let mut ledger = Ledger::new();
        ledger.register_product("Widget", 10, 250).unwrap();
        ledger.register_product("Gadget", 1, 1999).unwrap();
        ledger.register_customer("Alice").unwrap();
        ledger.register_customer("Bob").unwrap();
        ledger.record_sale(1, 3, 1).unwrap();
        ledger.record_sale(2, 1, 2).unwrap();
        ledger.fulfill_next_sale().unwrap();

        let expected = "\
==== PRODUTOS ====
ID: 1 | Nome: Widget | Quantidade: 7 | Preço: R$2.50
ID: 2 | Nome: Gadget | Quantidade: 0 | Preço: R$19.99

==== CLIENTES ====
ID Cliente: 1 | Nome: Alice | Total Gasto: R$7.50
ID Cliente: 2 | Nome: Bob | Total Gasto: R$19.99

==== VENDAS ====
Venda 1 | Produto: Widget (ID 1) | Cliente: Alice (ID 1) | Qtd: 3 | Valor: R$7.50
Venda 2 | Produto: Gadget (ID 2) | Cliente: Bob (ID 2) | Qtd: 1 | Valor: R$19.99

Valor total do estoque: R$17.50
Valor total de vendas: R$27.49
";
        assert_eq!(render_report(&ledger), expected);
    }

    #[test]
    fn test_undone_sales_leave_the_report() {
        let mut ledger = Ledger::new();
        ledger.register_product("Widget", 10, 250).unwrap();
        ledger.register_customer("Alice").unwrap();
        ledger.record_sale(1, 3, 1).unwrap();
        ledger.undo_last_operation().unwrap();

        let report = render_report(&ledger);
        assert!(!report.contains("Venda 1"));
        assert!(report.contains("Total Gasto: R$0.00"));
        assert!(report.ends_with("Valor total de vendas: R$0.00\n"));
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_REPORT_PATH);
        let mut ledger = Ledger::new();
        ledger.register_product("Widget", 2, 100).unwrap();

        write_report(&ledger, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, render_report(&ledger));
    }
}

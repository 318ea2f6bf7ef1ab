mod common;

use anyhow::Result;
use common::{test_service, StandardShop};
use stockledger::application::{render_report, write_report};
use stockledger::io::{Exporter, ImportOptions, Importer, LedgerExport};

#[tokio::test]
async fn test_export_products_and_customers_csv() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardShop::create(&service).await?;
    service.record_sale(1, 3, 1).await?;

    let exporter = Exporter::new(&service);

    let mut buf = Vec::new();
    let count = exporter.export_products_csv(&mut buf).await?;
    assert_eq!(count, 2);
    assert_eq!(
        String::from_utf8(buf)?,
        "id,name,quantity,unit_price_cents\n1,Widget,7,250\n2,Gadget,4,1999\n"
    );

    let mut buf = Vec::new();
    let count = exporter.export_customers_csv(&mut buf).await?;
    assert_eq!(count, 2);
    assert_eq!(
        String::from_utf8(buf)?,
        "id,name,total_spent_cents\n1,Alice,750\n2,Bob,0\n"
    );

    Ok(())
}

#[tokio::test]
async fn test_export_sales_and_queue_csv() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardShop::create(&service).await?;
    service.record_sale(1, 3, 1).await?;
    service.record_sale(2, 1, 2).await?;
    service.fulfill_next_sale().await?;

    let exporter = Exporter::new(&service);

    let mut buf = Vec::new();
    assert_eq!(exporter.export_sales_csv(&mut buf).await?, 2);
    let mut reader = csv::Reader::from_reader(buf.as_slice());
    let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>()?;
    assert_eq!(&rows[0][0], "1");
    assert_eq!(&rows[0][3], "Widget");
    assert_eq!(&rows[0][7], "750");
    assert_eq!(&rows[1][0], "2");
    assert_eq!(&rows[1][5], "Bob");

    let mut buf = Vec::new();
    assert_eq!(exporter.export_queue_csv(&mut buf).await?, 1);
    let mut reader = csv::Reader::from_reader(buf.as_slice());
    let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>()?;
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][0], "2");

    Ok(())
}

#[tokio::test]
async fn test_full_json_round_trip() -> Result<()> {
    let (source, _source_temp) = test_service().await?;
    StandardShop::create(&source).await?;
    source.record_sale(1, 3, 1).await?;
    source.record_sale(2, 2, 2).await?;
    source.fulfill_next_sale().await?;

    let mut buf = Vec::new();
    let export = Exporter::new(&source).export_full_json(&mut buf).await?;
    assert_eq!(export.ledger.history.len(), 2);
    assert_eq!(export.ledger.pending.len(), 1);

    let parsed: LedgerExport = serde_json::from_slice(&buf)?;
    assert_eq!(parsed.version, env!("CARGO_PKG_VERSION"));

    let (target, _target_temp) = test_service().await?;
    let result = Importer::new(&target)
        .import_full_json(buf.as_slice(), ImportOptions::default())
        .await?;
    assert!(result.written);
    assert_eq!(result.products, 2);
    assert_eq!(result.customers, 2);
    assert_eq!(result.sales, 2);
    assert_eq!(result.pending, 1);

    assert_eq!(target.ledger().await?, source.ledger().await?);

    // Undo keeps working on the imported history
    let undone = target.undo_last_operation().await?;
    assert_eq!(undone.id, 2);
    assert!(target.view_pending_queue().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_import_dry_run_writes_nothing() -> Result<()> {
    let (source, _source_temp) = test_service().await?;
    StandardShop::create(&source).await?;

    let mut buf = Vec::new();
    Exporter::new(&source).export_full_json(&mut buf).await?;

    let (target, _target_temp) = test_service().await?;
    let result = Importer::new(&target)
        .import_full_json(buf.as_slice(), ImportOptions { dry_run: true })
        .await?;
    assert!(!result.written);
    assert_eq!(result.products, 2);
    assert!(target.list_products().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_import_rejects_inconsistent_snapshot() -> Result<()> {
    let (source, _source_temp) = test_service().await?;
    StandardShop::create(&source).await?;
    source.record_sale(1, 1, 1).await?;

    let mut buf = Vec::new();
    let mut export = Exporter::new(&source).export_full_json(&mut buf).await?;
    // A pending sale that is not in the history
    export.ledger.history.clear();
    let tampered = serde_json::to_vec(&export)?;

    let (target, _target_temp) = test_service().await?;
    target.register_product("Keep", 1, 1).await?;

    let result = Importer::new(&target)
        .import_full_json(tampered.as_slice(), ImportOptions::default())
        .await;
    assert!(result.is_err());

    let products = target.list_products().await?;
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "Keep");

    let result = Importer::new(&target)
        .import_full_json("not json".as_bytes(), ImportOptions::default())
        .await;
    assert!(result.is_err());

    Ok(())
}

#[tokio::test]
async fn test_import_rejects_reordered_queue_and_forged_amount() -> Result<()> {
    let (source, _source_temp) = test_service().await?;
    StandardShop::create(&source).await?;
    source.record_sale(1, 1, 1).await?;
    source.record_sale(1, 2, 2).await?;

    let mut buf = Vec::new();
    let export = Exporter::new(&source).export_full_json(&mut buf).await?;

    let mut reordered = export.clone();
    reordered.ledger.pending.reverse();

    let mut forged = export;
    forged.ledger.history[1].amount_cents = 999_999;
    forged.ledger.pending[1].amount_cents = 999_999;

    let (target, _target_temp) = test_service().await?;
    for tampered in [reordered, forged] {
        let json = serde_json::to_vec(&tampered)?;
        let result = Importer::new(&target)
            .import_full_json(json.as_slice(), ImportOptions::default())
            .await;
        assert!(result.is_err());
    }
    assert!(target.view_pending_queue().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_report_file_from_stored_ledger() -> Result<()> {
    let (service, temp) = test_service().await?;
    service.register_product("Widget", 10, 250).await?;
    service.register_customer("Alice").await?;
    service.record_sale(1, 3, 1).await?;

    let path = temp.path().join("estoque.txt");
    let ledger = service.ledger().await?;
    write_report(&ledger, &path)?;

    let written = std::fs::read_to_string(&path)?;
    assert_eq!(written, render_report(&ledger));
    assert_eq!(
        written,
        "==== PRODUTOS ====\n\
         ID: 1 | Nome: Widget | Quantidade: 7 | Preço: R$2.50\n\
         \n==== CLIENTES ====\n\
         ID Cliente: 1 | Nome: Alice | Total Gasto: R$7.50\n\
         \n==== VENDAS ====\n\
         Venda 1 | Produto: Widget (ID 1) | Cliente: Alice (ID 1) | Qtd: 3 | Valor: R$7.50\n\
         \nValor total do estoque: R$17.50\n\
         Valor total de vendas: R$7.50\n"
    );

    Ok(())
}

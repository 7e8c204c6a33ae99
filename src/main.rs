use clap::Parser;
use firestore_seed::adapters::probe::{ProbeReport, RangeProbe};
use firestore_seed::core::inspect::CollectionCount;
use firestore_seed::core::seed::{SeedOutcome, SeedReport};
use firestore_seed::core::{ItemOutcome, StoredDocument};
use firestore_seed::utils::error::ErrorSeverity;
use firestore_seed::utils::{logger, validation::Validate};
use firestore_seed::{
    BulkImporter, CliConfig, CollectionInspector, Command, ImportRequest, ImportSummary,
    LocalStorage, Result, SeedManifest, SeedRunner,
};

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting firestore-seed");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(&config).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };

        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn run(config: &CliConfig) -> Result<()> {
    match &config.command {
        Command::Import {
            collection,
            file,
            id_field,
        } => {
            let store = config.store_settings().connect()?;
            let importer = BulkImporter::new(LocalStorage::new(".".to_string()), store);

            println!("\n🚀 Starting import...\n");
            let request = ImportRequest::new(collection.clone(), file.clone())
                .with_id_field(id_field.clone());
            let summary = importer.import(&request).await?;
            print_summary(&summary);
            println!("\n🎉 Import finished!\n");
        }
        Command::Seed { manifest } => {
            let manifest = SeedManifest::from_file(manifest)?;
            manifest.validate()?;

            let settings = config.store_settings().with_overrides(&manifest.store);
            settings.validate()?;
            let importer =
                BulkImporter::new(LocalStorage::new(".".to_string()), settings.connect()?);

            let report = SeedRunner::new(&importer)
                .run(&manifest.import_requests())
                .await;
            print_seed_report(&report);
        }
        Command::Count {
            collection,
            preview,
        } => {
            let store = config.store_settings().connect()?;
            let count = CollectionInspector::new(&store).count(collection).await?;
            print_count(&count, *preview);
        }
        Command::Inspect { collection, limit } => {
            let store = config.store_settings().connect()?;
            let documents = CollectionInspector::new(&store)
                .sample(collection, *limit)
                .await?;
            print_documents(collection, &documents)?;
        }
        Command::Probe { url, range } => {
            let client = config.store_settings().http_client()?;
            let report = RangeProbe::new(client).probe(url, range).await?;
            print_probe(&report);
        }
    }

    Ok(())
}

fn print_summary(summary: &ImportSummary) {
    println!(
        "✅ Imported {} documents into '{}' from {}",
        summary.succeeded, summary.collection, summary.source
    );
    println!(
        "   total: {}, succeeded: {}, skipped: {}, failed: {}",
        summary.total, summary.succeeded, summary.skipped, summary.failed
    );

    for item in &summary.items {
        match &item.outcome {
            ItemOutcome::Skipped { reason } => {
                println!("   ⚠️ item {} skipped: {}", item.index, reason)
            }
            ItemOutcome::Failed { key, reason } => println!(
                "   ⚠️ item {} (id {}) failed: {}",
                item.index,
                key.as_deref().unwrap_or("-"),
                reason
            ),
            ItemOutcome::Written { .. } => {}
        }
    }
}

fn print_seed_report(report: &SeedReport) {
    for outcome in &report.outcomes {
        match outcome {
            SeedOutcome::Completed(summary) => print_summary(summary),
            SeedOutcome::Aborted { request, error } => println!(
                "❌ {} → '{}' aborted: {}",
                request.source_path, request.collection, error
            ),
        }
    }
    println!(
        "\n🎉 Seed finished in {:?}: {} documents written, {} imports aborted\n",
        report.duration,
        report.documents_written(),
        report.aborted_count()
    );
}

fn print_count(count: &CollectionCount, preview: usize) {
    println!(
        "📊 Total documents in '{}': {}",
        count.collection, count.total
    );
    println!(
        "📝 IDs: {:?}... (showing first {})",
        count.numeric_preview(preview),
        preview
    );
}

fn print_documents(collection: &str, documents: &[StoredDocument]) -> Result<()> {
    println!("📊 Document structure in '{}':\n", collection);
    for doc in documents {
        let fields: Vec<&String> = doc.data.keys().collect();
        println!("Document ID: {}", doc.id);
        println!("Fields: {:?}", fields);
        println!("Sample data: {}", serde_json::to_string(&doc.data)?);
        println!("{}", "-".repeat(80));
    }
    Ok(())
}

fn print_probe(report: &ProbeReport) {
    let show = |value: &Option<String>| value.clone().unwrap_or_else(|| "None".to_string());

    println!("Status code: {}", report.status);
    println!("Accept-Ranges: {}", show(&report.accept_ranges));
    println!("Content-Type: {}", show(&report.content_type));
    println!("Content-Length: {}", show(&report.content_length));
    println!("Content-Disposition: {}", show(&report.content_disposition));

    if report.streamable {
        println!("🎉 Range requests supported: the video can be streamed.");
    } else {
        println!("⚠ Range requests not honoured: this link only supports download.");
    }
}

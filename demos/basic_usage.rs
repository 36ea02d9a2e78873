use docsearch::{storage, Document, Index, SearchEngine};

fn main() -> anyhow::Result<()> {
    println!("=== docsearch Basic Usage Example ===\n");

    // Build an index from a small corpus
    println!("Building index...");

    let documents = vec![
        Document::new(
            "rust.txt".to_string(),
            "Rust Programming Language\nRust is a systems programming language that runs blazingly fast and guarantees thread safety.".to_string(),
        ),
        Document::new(
            "go.txt".to_string(),
            "Go Programming Language\nGo is an open source programming language for building simple, reliable software.".to_string(),
        ),
        Document::new(
            "python.txt".to_string(),
            "Python Programming\nPython is a programming language that lets you work quickly and integrate systems.".to_string(),
        ),
    ];

    let index = Index::build(documents);
    let stats = index.stats();
    println!(
        "✓ Indexed {} documents, {} distinct terms\n",
        stats.documents, stats.terms
    );

    // Example 1: ranked conjunctive search
    println!("--- Example 1: Search for 'programming language' ---");
    let engine = SearchEngine::new(index, 64)?;
    let outcome = engine.search("programming language");

    println!(
        "Found {} documents in {:.3}ms (cached: {})",
        outcome.results.len(),
        outcome.elapsed.as_secs_f64() * 1000.0,
        outcome.was_cached
    );
    for (i, scored) in outcome.results.iter().enumerate() {
        println!(
            "{}. [Score: {:.4}] {}",
            i + 1,
            scored.score,
            outcome.snapshot.source(scored.doc_id).unwrap_or("?")
        );
    }

    // Example 2: the repeated query is served from the cache
    println!("\n--- Example 2: Repeat the query ---");
    let outcome = engine.search("programming language");
    println!(
        "Found {} documents in {:.3}ms (cached: {})",
        outcome.results.len(),
        outcome.elapsed.as_secs_f64() * 1000.0,
        outcome.was_cached
    );

    // Example 3: AND semantics — a term missing everywhere empties the result
    println!("\n--- Example 3: Search for 'programming haskell' ---");
    let outcome = engine.search("programming haskell");
    println!("Found {} documents", outcome.results.len());

    // Example 4: persist and reload the index
    println!("\n--- Example 4: Save and reload ---");
    let path = std::env::temp_dir().join("docsearch_demo_index.json");
    storage::save_index(&engine.snapshot(), &path)?;
    let reloaded = storage::load_index(&path)?;
    println!(
        "Reloaded index with {} documents from {}",
        reloaded.doc_count(),
        path.display()
    );

    // Example 5: service statistics
    println!("\n--- Example 5: Stats ---");
    println!("{}", serde_json::to_string_pretty(&engine.stats())?);

    Ok(())
}

//! Command implementations for the recommend CLI.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::catalog::{MemoryCatalog, ProductId, UserId};
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::RecommenderConfig;
use crate::error::{RecommendError, Result};
use crate::recommend::HybridRecommender;

/// Execute a CLI command.
pub fn execute_command(args: RecommendArgs) -> Result<()> {
    let recommender = build_recommender(&args)?;

    match &args.command {
        Command::Related(related_args) => related(&recommender, related_args, &args),
        Command::Personalized(personalized_args) => {
            personalized(&recommender, personalized_args, &args)
        }
        Command::Trending(trending_args) => trending(&recommender, trending_args, &args),
        Command::Similar(similar_args) => similar(&recommender, similar_args, &args),
        Command::Stats(stats_args) => show_stats(&recommender, stats_args, &args),
    }
}

/// Load the catalog and configuration named on the command line.
pub fn build_recommender(args: &RecommendArgs) -> Result<HybridRecommender> {
    let catalog_path = args.catalog.as_ref().ok_or_else(|| {
        RecommendError::invalid_argument("a catalog file is required (--catalog or CURIO_CATALOG)")
    })?;

    let config = match &args.config {
        Some(path) => RecommenderConfig::from_json_file(path)?,
        None => RecommenderConfig::default(),
    };

    let catalog = Arc::new(MemoryCatalog::from_json_file(catalog_path)?);
    info!(
        path = %catalog_path.display(),
        products = catalog.len(),
        "catalog loaded"
    );

    let recommender = HybridRecommender::new(catalog, config)?;
    Ok(match args.seed {
        Some(seed) => recommender.with_seed(seed),
        None => recommender,
    })
}

fn related(
    recommender: &HybridRecommender,
    args: &RelatedArgs,
    cli_args: &RecommendArgs,
) -> Result<()> {
    let start_time = Instant::now();
    let product_ids = recommender.related_products(ProductId(args.product_id), args.limit)?;

    output_result(
        "Related products",
        &RecommendationOutput {
            operation: "related".to_string(),
            product_id: Some(ProductId(args.product_id)),
            user_id: None,
            limit: args.limit,
            product_ids,
            duration_ms: start_time.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

fn personalized(
    recommender: &HybridRecommender,
    args: &PersonalizedArgs,
    cli_args: &RecommendArgs,
) -> Result<()> {
    let start_time = Instant::now();
    let user = UserId(args.user_id);
    for view in &args.views {
        recommender.track_view(user, ProductId(*view));
    }
    let product_ids = recommender.personalized_recommendations(user, args.limit)?;

    output_result(
        "Personalized recommendations",
        &RecommendationOutput {
            operation: "personalized".to_string(),
            product_id: None,
            user_id: Some(args.user_id),
            limit: args.limit,
            product_ids,
            duration_ms: start_time.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

fn trending(
    recommender: &HybridRecommender,
    args: &TrendingArgs,
    cli_args: &RecommendArgs,
) -> Result<()> {
    let start_time = Instant::now();
    let product_ids = recommender.trending_products(args.limit)?;

    output_result(
        "Trending products",
        &RecommendationOutput {
            operation: "trending".to_string(),
            product_id: None,
            user_id: None,
            limit: args.limit,
            product_ids,
            duration_ms: start_time.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

fn similar(
    recommender: &HybridRecommender,
    args: &SimilarArgs,
    cli_args: &RecommendArgs,
) -> Result<()> {
    let start_time = Instant::now();
    let results = recommender.similar_products(ProductId(args.product_id), args.limit)?;

    output_result(
        "Similar products",
        &SimilarityOutput {
            product_id: ProductId(args.product_id),
            limit: args.limit,
            results,
            duration_ms: start_time.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

fn show_stats(
    recommender: &HybridRecommender,
    args: &StatsArgs,
    cli_args: &RecommendArgs,
) -> Result<()> {
    let stats = if args.build {
        recommender.rebuild_embeddings()?
    } else {
        recommender.stats()
    };

    output_result("Recommender statistics", &stats, cli_args)
}

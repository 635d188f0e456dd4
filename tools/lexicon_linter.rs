/// Lexicon Linter — validates a lexicon directory's coverage and quality.
///
/// Usage: lexicon_linter <lexicon_dir>
///
/// Expects `<lexicon_dir>/shared/{tags,mandarin,cantonese,blacklist}.ron`
/// and one `<lexicon_dir>/<region>/` directory per region.
use rustc_hash::FxHashSet;
use std::path::Path;
use std::process;

use chinese_name_engine::core::lexicon::Lexicon;
use chinese_name_engine::core::loader::{has_region_dir, DirSource, RegionSource};
use chinese_name_engine::schema::lexicon::{Phonology, Region, RegionData, WeightedChar};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: lexicon_linter <lexicon_dir>");
        process::exit(0);
    }

    let root = Path::new(&args[1]);
    if !root.is_dir() {
        eprintln!("ERROR: Path '{}' does not exist", root.display());
        process::exit(1);
    }

    let lexicon = match Lexicon::load_from_dir(&root.join("shared")) {
        Ok(lexicon) => lexicon,
        Err(e) => {
            eprintln!("ERROR: Failed to load shared tables: {}", e);
            process::exit(1);
        }
    };
    println!(
        "Loaded {} tagged chars, {} Mandarin and {} Cantonese readings",
        lexicon.tags.len(),
        lexicon.mandarin.len(),
        lexicon.cantonese.len()
    );

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let source = DirSource::new(root);

    for &region in Region::all() {
        if !has_region_dir(root, region) {
            warnings.push(format!("No data directory for region {}", region));
            continue;
        }
        match source.fetch(region) {
            Ok(data) => {
                println!(
                    "  {}: {} surnames, {} chars, {} bigrams",
                    region,
                    data.surnames.len(),
                    data.chars.male.len() + data.chars.female.len() + data.chars.unisex.len(),
                    data.bigrams.len()
                );
                lint_region(region, &data, &lexicon, &mut errors, &mut warnings);
            }
            Err(e) => errors.push(format!("Region {} failed to load: {}", region, e)),
        }
    }

    // Print report
    println!("\n=== Lexicon Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn lint_region(
    region: Region,
    data: &RegionData,
    lexicon: &Lexicon,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    let mut surnames = FxHashSet::default();
    for s in &data.surnames {
        if s.weight < 0.0 {
            errors.push(format!("{}: surname '{}' has negative weight", region, s.surname));
        }
        if !surnames.insert(s.surname.as_str()) {
            warnings.push(format!("{}: surname '{}' listed twice", region, s.surname));
        }
        if s.strokes.is_none() {
            warnings.push(format!("{}: surname '{}' has no stroke count", region, s.surname));
        }
    }

    let mut known: FxHashSet<char> = FxHashSet::default();
    for (pool, chars) in [
        ("male", &data.chars.male),
        ("female", &data.chars.female),
        ("unisex", &data.chars.unisex),
    ] {
        let mut seen = FxHashSet::default();
        for wc in chars.iter() {
            known.insert(wc.ch);
            if !seen.insert(wc.ch) {
                warnings.push(format!(
                    "{}: '{}' appears twice in the {} pool",
                    region, wc.ch, pool
                ));
            }
            lint_char(region, pool, wc, lexicon, errors, warnings);
        }
    }

    for b in &data.bigrams {
        if b.weight < 0.0 {
            errors.push(format!("{}: bigram {}{} has negative weight", region, b.first, b.second));
        }
        if b.first == b.second {
            errors.push(format!("{}: bigram {}{} repeats a character", region, b.first, b.second));
        }
        for ch in [b.first, b.second] {
            if !known.contains(&ch) {
                warnings.push(format!(
                    "{}: bigram {}{} uses '{}' which is in no character pool",
                    region, b.first, b.second, ch
                ));
            }
        }
    }
}

fn lint_char(
    region: Region,
    pool: &str,
    wc: &WeightedChar,
    lexicon: &Lexicon,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    if wc.weight < 0.0 {
        errors.push(format!("{}: '{}' in the {} pool has negative weight", region, wc.ch, pool));
    }
    if lexicon.general_blacklist_hit(&wc.ch.to_string()).is_some() {
        errors.push(format!("{}: '{}' is blacklisted", region, wc.ch));
    }
    let has_reading = match region.phonology() {
        Phonology::Mandarin => lexicon.mandarin.contains_key(&wc.ch),
        Phonology::Cantonese => lexicon.cantonese.contains_key(&wc.ch),
    };
    if !has_reading {
        warnings.push(format!("{}: '{}' has no {:?} reading", region, wc.ch, region.phonology()));
    }
    if lexicon.tags_for(wc.ch, Some(wc)).is_empty() {
        warnings.push(format!("{}: '{}' has no tags", region, wc.ch));
    }
    if wc.strokes.is_none() {
        warnings.push(format!("{}: '{}' has no stroke count", region, wc.ch));
    }
}

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len() as u64) as usize]
    }
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let domains = ["Formation", "Équipement", "Communication", "Études"];
    let lines = ["LB-101", "LB-102", "LB-205", "LB-310"];
    let actions = [
        "Atelier régional",
        "Achat de matériel",
        "Campagne radio",
        "Enquête de terrain",
        "Séminaire",
    ];
    let year_start = NaiveDate::from_ymd_opt(2023, 1, 1).context("invalid start date")?;

    let output_path = "sample_plan.csv";
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(output_path)
        .with_context(|| format!("creating {output_path}"))?;

    writer.write_record([
        "Action",
        "Domaines de dépense",
        "Ligne budgétaire",
        "Montant",
        "Date de début",
        "Date de fin",
        "Date_Paiement",
    ])?;

    let n_rows = 60;
    for _ in 0..n_rows {
        let start = year_start + Duration::days(rng.below(365) as i64);
        let end = start + Duration::days(7 + rng.below(90) as i64);
        // Roughly one payment date in eight is left unreadable.
        let paid = if rng.below(8) == 0 {
            "à définir".to_string()
        } else {
            (end + Duration::days(rng.below(30) as i64))
                .format("%d/%m/%Y")
                .to_string()
        };
        let amount = format!("{}.{:02}", 500 + rng.below(20_000), rng.below(100));

        writer.write_record([
            rng.pick(&actions),
            rng.pick(&domains),
            rng.pick(&lines),
            amount.as_str(),
            start.format("%d/%m/%Y").to_string().as_str(),
            end.format("%d/%m/%Y").to_string().as_str(),
            paid.as_str(),
        ])?;
    }
    writer.flush().context("flushing CSV")?;

    println!("Wrote {n_rows} plan rows to {output_path}");
    Ok(())
}

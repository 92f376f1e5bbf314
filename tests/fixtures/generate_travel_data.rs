// ==========================================
// 航次测试数据生成器
// ==========================================
// 用途: 生成确定性的示例航次目录
// 输出: tests/fixtures/travels/<travel>/{ship.ship_plan, ship.route, *.cargo_data}
// 用法: cargo run --bin generate_travel_data -- [输出目录]
// ==========================================

use csv::WriterBuilder;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_OUTPUT: &str = "tests/fixtures/travels";

// 港口池（5 位大写字母）
const PORTS: &[&str] = &["CNSHA", "SGSIN", "NLRTM", "DEHAM", "USNYC", "ILHFA", "FRLEH", "JPTYO"];

// 箱主代码（3 位字母 + 类别 U）
const OWNERS: &[&str] = &["MSC", "CMA", "HLX", "ONE", "ZIM"];

// 固定种子的线性同余发生器, 保证每次生成结果相同
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, bound: usize) -> usize {
        (self.next() % bound as u64) as usize
    }
}

// 航次描述
struct TravelProfile {
    name: &'static str,
    decks: usize,
    rows: usize,
    cols: usize,
    ports: usize,
    per_port: usize,
    blocked_columns: usize,
    seed: u64,
}

const TRAVELS: &[TravelProfile] = &[
    TravelProfile {
        name: "travel_01_small",
        decks: 2,
        rows: 2,
        cols: 2,
        ports: 4,
        per_port: 3,
        blocked_columns: 0,
        seed: 1,
    },
    TravelProfile {
        name: "travel_02_medium",
        decks: 4,
        rows: 3,
        cols: 4,
        ports: 6,
        per_port: 12,
        blocked_columns: 3,
        seed: 7,
    },
    TravelProfile {
        name: "travel_03_overbooked",
        decks: 2,
        rows: 2,
        cols: 2,
        ports: 4,
        per_port: 10,
        blocked_columns: 1,
        seed: 42,
    },
    TravelProfile {
        name: "travel_04_long_route",
        decks: 3,
        rows: 4,
        cols: 4,
        ports: 8,
        per_port: 15,
        blocked_columns: 4,
        seed: 2024,
    },
];

fn main() -> Result<(), Box<dyn Error>> {
    let output = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    println!("开始生成航次数据集 -> {}", output.display());
    for profile in TRAVELS {
        generate_travel(&output, profile)?;
        println!("✓ 生成 {}", profile.name);
    }

    // 非法输入: 单港航线（整航次被移除）
    let broken = output.join("travel_90_single_port");
    fs::create_dir_all(&broken)?;
    fs::write(broken.join("ship.ship_plan"), "1,1,1\n")?;
    fs::write(broken.join("ship.route"), "CNSHA\n")?;
    println!("✓ 生成 travel_90_single_port");

    println!("✓ 所有航次数据集生成完成！");
    Ok(())
}

fn generate_travel(root: &Path, profile: &TravelProfile) -> Result<(), Box<dyn Error>> {
    let dir = root.join(profile.name);
    fs::create_dir_all(&dir)?;
    let mut rng = Lcg(profile.seed);

    // 船型: 首行尺寸, 随后若干列减少可用层数
    let mut plan = format!("{},{},{}\n", profile.decks, profile.rows, profile.cols);
    let mut blocked: Vec<(usize, usize)> = Vec::new();
    while blocked.len() < profile.blocked_columns.min(profile.rows * profile.cols) {
        let x = rng.below(profile.rows);
        let y = rng.below(profile.cols);
        // 每列只声明一次
        if blocked.contains(&(x, y)) {
            continue;
        }
        blocked.push((x, y));
        let available = rng.below(profile.decks);
        plan.push_str(&format!("{},{},{}\n", x, y, available));
    }
    fs::write(dir.join("ship.ship_plan"), plan)?;

    // 航线: 从港口池取不相邻重复的序列
    let mut route: Vec<&str> = Vec::with_capacity(profile.ports);
    while route.len() < profile.ports {
        let port = PORTS[rng.below(PORTS.len())];
        if route.last() != Some(&port) {
            route.push(port);
        }
    }
    fs::write(dir.join("ship.route"), route.join("\n") + "\n")?;

    // 舱单: 最后一港不写
    let mut serial = 0u32;
    for (index, port) in route.iter().enumerate().take(profile.ports - 1) {
        let visit = route[..=index].iter().filter(|p| *p == port).count();

        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(dir.join(format!("{}_{}.cargo_data", port, visit)))?;
        for _ in 0..profile.per_port {
            serial += 1;
            let owner = OWNERS[rng.below(OWNERS.len())];
            let id = format!("{}U{:07}", owner, serial);
            let weight = 500 + rng.below(30) * 100;
            let destination = route[index + 1 + rng.below(profile.ports - index - 1)];
            writer.write_record(&[id, weight.to_string(), destination.to_string()])?;
        }
        writer.flush()?;
    }
    Ok(())
}

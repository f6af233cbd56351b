//! 随机数流
//!
//! 每个随机量使用独立编号的流，由同一个实验种子派生；
//! 增减某一类随机量不会改变其他流的抽样序列。

use rand::SeedableRng;
use rand::rngs::StdRng;

/// 派生编号为 `stream` 的独立随机数流
pub fn stream_rng(seed: u64, stream: u64) -> StdRng {
    StdRng::seed_from_u64(mix64(seed ^ mix64(stream)))
}

/// 一个简单、确定性的 64-bit mixing（splitmix64）。
fn mix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

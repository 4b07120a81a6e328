//! Sample orders drawn from a fixed menu of Spanish dishes.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::Result;
use crate::order::WorkItem;

/// The dishes the sample generator picks from.
pub const DISHES: [&str; 20] = [
    "Tortilla de Patatas",
    "Gazpacho Andaluz",
    "Croquetas de Jamón",
    "Paella Valenciana",
    "Pulpo a la Gallega",
    "Fabada Asturiana",
    "Cochinillo Segoviano",
    "Jamón Ibérico",
    "Crema Catalana",
    "Patatas Bravas",
    "Gambas al Ajillo",
    "Salmorejo Cordobés",
    "Chuletón de Buey",
    "Marmitako",
    "Pisto Manchego",
    "Bacalao al Pil Pil",
    "Callos a la Madrileña",
    "Migas Extremeñas",
    "Rabo de Toro",
    "Churros con Chocolate",
];

/// Picks an order count in `min..=max` (bounds swapped if reversed).
pub fn random_order_count<R: Rng + ?Sized>(rng: &mut R, min: usize, max: usize) -> usize {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    rng.gen_range(lo..=hi)
}

/// Builds `count` orders numbered from 1, each with a random dish.
/// Dishes may repeat.
pub fn random_orders<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Result<Vec<WorkItem>> {
    (1..=count as u64)
        .map(|id| {
            let dish = DISHES.choose(&mut *rng).copied().unwrap_or(DISHES[0]);
            WorkItem::new(id, dish)
        })
        .collect()
}

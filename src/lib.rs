pub mod ar_dice;

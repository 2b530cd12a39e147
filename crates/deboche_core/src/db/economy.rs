use sqlx::SqliteConnection;
use tracing::{debug, info};

use super::Database;
use super::profile::ensure_user_on;
use crate::casino::{self, SlotSpin};
use crate::id::UserId;
use crate::reply::{EmbedSpec, Reply};
use crate::{CoreError, Result};

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct InventoryItem {
    pub item: String,
    pub qty: i64,
    pub selling: bool,
    pub price: i64,
}

async fn balance_on(conn: &mut SqliteConnection, user: UserId) -> Result<i64> {
    sqlx::query_scalar("SELECT coins FROM users WHERE discord_id = ?1")
        .bind(user.as_db())
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| CoreError::database("balance", e))
}

async fn adjust_on(conn: &mut SqliteConnection, user: UserId, delta: i64) -> Result<i64> {
    sqlx::query_scalar("UPDATE users SET coins = coins + ?1 WHERE discord_id = ?2 RETURNING coins")
        .bind(delta)
        .bind(user.as_db())
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| CoreError::database("adjust_coins", e))
}

async fn user_row_id(conn: &mut SqliteConnection, user: UserId) -> Result<i64> {
    ensure_user_on(conn, user).await?;
    sqlx::query_scalar("SELECT id FROM users WHERE discord_id = ?1")
        .bind(user.as_db())
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| CoreError::database("user_row_id", e))
}

impl Database {
    pub async fn balance(&self, user: UserId) -> Result<i64> {
        Ok(self.get_user(user).await?.coins)
    }

    /// Credit coins and return the new balance
    pub async fn add_coins(&self, user: UserId, amount: i64) -> Result<i64> {
        if amount < 0 {
            return Err(CoreError::invalid_amount(amount, "não pode ser negativa"));
        }
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| CoreError::database("add_coins", e))?;
        ensure_user_on(&mut conn, user).await?;
        let balance = adjust_on(&mut conn, user, amount).await?;
        debug!(user_id = %user, amount, balance, "coins credited");
        Ok(balance)
    }

    /// Move coins between two users atomically. Returns the sender's new balance.
    pub async fn transfer_coins(&self, from: UserId, to: UserId, amount: i64) -> Result<i64> {
        if amount <= 0 {
            return Err(CoreError::invalid_amount(amount, "tem de ser positiva"));
        }
        if from == to {
            return Err(CoreError::invalid_amount(amount, "não podes dar moedas a ti próprio"));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CoreError::database("transfer_coins", e))?;

        ensure_user_on(&mut tx, from).await?;
        ensure_user_on(&mut tx, to).await?;

        let balance = balance_on(&mut tx, from).await?;
        if balance < amount {
            return Err(CoreError::InsufficientFunds {
                user_id: from,
                balance,
                required: amount,
            });
        }

        let remaining = adjust_on(&mut tx, from, -amount).await?;
        adjust_on(&mut tx, to, amount).await?;

        tx.commit()
            .await
            .map_err(|e| CoreError::database("transfer_coins", e))?;

        info!(from = %from, to = %to, amount, "coins transferred");
        Ok(remaining)
    }

    /// Random 50 to 200 coins. Returns `(earned, balance)`.
    pub async fn work(&self, user: UserId) -> Result<(i64, i64)> {
        let earned = casino::work_reward(&mut rand::rng());
        let balance = self.add_coins(user, earned).await?;
        Ok((earned, balance))
    }

    /// One of 0, 1, 2, 5, 10 or 15 coins. Returns `(earned, balance)`.
    pub async fn beg(&self, user: UserId) -> Result<(i64, i64)> {
        let earned = casino::beg_reward(&mut rand::rng());
        let balance = self.add_coins(user, earned).await?;
        Ok((earned, balance))
    }

    /// Spin the slot machine for `bet` coins. Returns the spin and the new balance.
    pub async fn slot(&self, user: UserId, bet: i64) -> Result<(SlotSpin, i64)> {
        let spin = SlotSpin::play(bet, &mut rand::rng())?;
        let balance = self.settle_slot(user, &spin).await?;
        Ok((spin, balance))
    }

    /// Apply a spin: balance = balance - bet + winnings
    pub async fn settle_slot(&self, user: UserId, spin: &SlotSpin) -> Result<i64> {
        if spin.bet <= 0 {
            return Err(CoreError::invalid_amount(spin.bet, "tem de ser positiva"));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CoreError::database("slot", e))?;

        ensure_user_on(&mut tx, user).await?;
        let balance = balance_on(&mut tx, user).await?;
        if balance < spin.bet {
            return Err(CoreError::InsufficientFunds {
                user_id: user,
                balance,
                required: spin.bet,
            });
        }

        let balance = adjust_on(&mut tx, user, spin.net()).await?;
        tx.commit()
            .await
            .map_err(|e| CoreError::database("slot", e))?;

        debug!(user_id = %user, bet = spin.bet, winnings = spin.winnings, "slot settled");
        Ok(balance)
    }

    pub async fn inventory(&self, user: UserId) -> Result<Vec<InventoryItem>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| CoreError::database("inventory", e))?;
        let owner = user_row_id(&mut conn, user).await?;

        sqlx::query_as::<_, InventoryItem>(
            "SELECT item, qty, selling, price FROM inventory WHERE user_id = ?1 ORDER BY item",
        )
        .bind(owner)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| CoreError::database("inventory", e))
    }

    /// Coins plus inventory, as shown by `/carteira`
    pub async fn wallet(&self, user: UserId, display_name: &str) -> Result<Reply> {
        let coins = self.balance(user).await?;
        let items = self.inventory(user).await?;
        Ok(render_wallet(display_name, coins, &items))
    }
}

pub fn render_wallet(display_name: &str, coins: i64, items: &[InventoryItem]) -> Reply {
    let listing = if items.is_empty() {
        "Não tens nenhum item no inventário.".to_string()
    } else {
        items
            .iter()
            .map(|item| {
                let mut line = format!("**{}** x{}", item.item, item.qty);
                if item.selling {
                    line.push_str(&format!(" - 💰 {} coins", item.price));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    Reply::embed(
        EmbedSpec::new(format!("Inventário de {}", display_name))
            .description(format!("💰 Coins: {}\n\n{}", coins, listing))
            .colour(0x2F3136),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_db;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_add_coins() {
        let db = memory_db().await;
        assert_eq!(db.add_coins(UserId(1), 100).await.unwrap(), 100);
        assert_eq!(db.add_coins(UserId(1), 25).await.unwrap(), 125);
        assert!(db.add_coins(UserId(1), -5).await.is_err());
        assert_eq!(db.balance(UserId(1)).await.unwrap(), 125);
    }

    #[tokio::test]
    async fn test_transfer_moves_coins() {
        let db = memory_db().await;
        db.add_coins(UserId(1), 100).await.unwrap();

        let remaining = db.transfer_coins(UserId(1), UserId(2), 40).await.unwrap();
        assert_eq!(remaining, 60);
        assert_eq!(db.balance(UserId(2)).await.unwrap(), 40);
    }

    #[tokio::test]
    async fn test_transfer_rejections_leave_balances_alone() {
        let db = memory_db().await;
        db.add_coins(UserId(1), 10).await.unwrap();

        let err = db.transfer_coins(UserId(1), UserId(2), 11).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientFunds {
                balance: 10,
                required: 11,
                ..
            }
        ));
        assert!(matches!(
            db.transfer_coins(UserId(1), UserId(2), 0).await,
            Err(CoreError::InvalidAmount { .. })
        ));
        assert!(matches!(
            db.transfer_coins(UserId(1), UserId(1), 5).await,
            Err(CoreError::InvalidAmount { .. })
        ));

        assert_eq!(db.balance(UserId(1)).await.unwrap(), 10);
        assert_eq!(db.balance(UserId(2)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_work_and_beg_credit_balance() {
        let db = memory_db().await;
        let (earned, balance) = db.work(UserId(3)).await.unwrap();
        assert!(casino::WORK_RANGE.contains(&earned));
        assert_eq!(balance, earned);

        let (begged, balance) = db.beg(UserId(3)).await.unwrap();
        assert!(casino::BEG_REWARDS.contains(&begged));
        assert_eq!(balance, earned + begged);
    }

    #[tokio::test]
    async fn test_settle_slot() {
        let db = memory_db().await;
        db.add_coins(UserId(1), 50).await.unwrap();

        let losing = SlotSpin {
            reels: ["🍋", "🍒", "💎"],
            bet: 20,
            winnings: 0,
        };
        assert_eq!(db.settle_slot(UserId(1), &losing).await.unwrap(), 30);

        let jackpot = SlotSpin {
            reels: ["💎", "💎", "💎"],
            bet: 10,
            winnings: 50,
        };
        assert_eq!(db.settle_slot(UserId(1), &jackpot).await.unwrap(), 70);

        let too_big = SlotSpin {
            reels: ["💎", "💎", "💎"],
            bet: 71,
            winnings: 355,
        };
        assert!(matches!(
            db.settle_slot(UserId(1), &too_big).await,
            Err(CoreError::InsufficientFunds { .. })
        ));
    }

    #[tokio::test]
    async fn test_slot_refuses_huge_bet() {
        let db = memory_db().await;
        db.add_coins(UserId(4), 100).await.unwrap();

        assert!(matches!(
            db.slot(UserId(4), i64::MAX).await,
            Err(CoreError::InvalidAmount { .. })
        ));
        assert_eq!(db.balance(UserId(4)).await.unwrap(), 100);
    }

    async fn stock(db: &Database, user: UserId, item: &str, qty: i64, price: i64, selling: bool) {
        let mut conn = db.pool.acquire().await.unwrap();
        let owner = user_row_id(&mut conn, user).await.unwrap();
        sqlx::query(
            "INSERT INTO inventory (user_id, item, qty, price, selling)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(owner)
        .bind(item)
        .bind(qty)
        .bind(price)
        .bind(selling)
        .execute(&mut *conn)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_inventory_is_sorted_by_item() {
        let db = memory_db().await;
        let user = UserId(9);
        assert!(db.inventory(user).await.unwrap().is_empty());

        stock(&db, user, "cerveja", 5, 0, false).await;
        stock(&db, user, "bifana", 1, 5, true).await;

        let items = db.inventory(user).await.unwrap();
        assert_eq!(
            items,
            vec![
                InventoryItem {
                    item: "bifana".to_string(),
                    qty: 1,
                    selling: true,
                    price: 5,
                },
                InventoryItem {
                    item: "cerveja".to_string(),
                    qty: 5,
                    selling: false,
                    price: 0,
                },
            ]
        );
        assert!(db.inventory(UserId(10)).await.unwrap().is_empty());
    }

    #[test]
    fn test_wallet_render() {
        let items = vec![InventoryItem {
            item: "bifana".to_string(),
            qty: 2,
            selling: true,
            price: 5,
        }];
        let reply = render_wallet("Zé", 120, &items);
        let description = reply.embed.unwrap().description.unwrap();
        assert_eq!(description, "💰 Coins: 120\n\n**bifana** x2 - 💰 5 coins");

        let empty = render_wallet("Zé", 0, &[]);
        assert!(empty
            .embed
            .unwrap()
            .description
            .unwrap()
            .ends_with("Não tens nenhum item no inventário."));
    }
}

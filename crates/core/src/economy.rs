//! Pay, bank balance and loan bookkeeping.

use thiserror::Error;
use tracing::info;

use crate::{config::DEFAULT_SALARY, money::Money};

/// A loan may be at most this many times the current balance.
pub const LOAN_BALANCE_MULTIPLIER: i64 = 2;
/// Share of banked pay that goes towards an outstanding loan.
pub const LOAN_DEDUCTION_PERCENT: i64 = 10;

/// Rejected economy actions. The messages are shown to the player as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EconomyError {
    /// Zero or negative loan request.
    #[error("Please enter a loan amount greater than zero.")]
    InvalidLoanAmount,
    /// Requested more than twice the balance.
    #[error("Your balance is too low to borrow this amount!")]
    LoanExceedsLimit {
        /// Amount asked for.
        requested: Money,
        /// Largest loan the balance allows.
        limit: Money,
    },
    /// A previous loan is still being paid off.
    #[error("You haven't paid off your previous loan yet!")]
    OutstandingLoan,
    /// Repayment requested without any loan.
    #[error("You don't have a loan to repay.")]
    NoOutstandingLoan,
    /// Balance does not cover the price.
    #[error("Your balance is too low to buy this laptop!")]
    InsufficientBalance {
        /// Price of the item.
        price: Money,
        /// Balance at the time of the attempt.
        balance: Money,
    },
}

/// Result of moving pay into the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankDeposit {
    /// Amount added to the balance.
    pub deposited: Money,
    /// Amount taken from pay to reduce the loan.
    pub loan_payment: Money,
}

/// Result of paying pay directly against the loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanRepayment {
    /// Amount taken from pay.
    pub paid: Money,
    /// Whether the loan is now fully repaid.
    pub cleared: bool,
}

/// The player's money. Lives for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EconomyState {
    balance: Money,
    pay: Money,
    loan: Money,
    items_owned: u32,
    salary: Money,
}

impl Default for EconomyState {
    fn default() -> Self {
        Self::new(Money::from_euros(DEFAULT_SALARY))
    }
}

impl EconomyState {
    /// Fresh state with nothing earned, banked or borrowed.
    pub fn new(salary: Money) -> Self {
        Self {
            balance: Money::ZERO,
            pay: Money::ZERO,
            loan: Money::ZERO,
            items_owned: 0,
            salary,
        }
    }

    /// Money in the bank.
    pub fn balance(&self) -> Money {
        self.balance
    }

    /// Money earned but not yet banked.
    pub fn pay(&self) -> Money {
        self.pay
    }

    /// Outstanding loan, zero when none.
    pub fn loan(&self) -> Money {
        self.loan
    }

    /// True while a loan is outstanding.
    pub fn has_loan(&self) -> bool {
        self.loan.is_positive()
    }

    /// Number of laptops bought so far.
    pub fn items_owned(&self) -> u32 {
        self.items_owned
    }

    /// Pay earned per shift.
    pub fn salary(&self) -> Money {
        self.salary
    }

    /// Largest loan the current balance allows.
    pub fn loan_limit(&self) -> Money {
        self.balance.times(LOAN_BALANCE_MULTIPLIER)
    }

    /// Borrow `amount`, adding it to both balance and loan.
    pub fn request_loan(&mut self, amount: Money) -> Result<(), EconomyError> {
        if !amount.is_positive() {
            return Err(EconomyError::InvalidLoanAmount);
        }
        let limit = self.loan_limit();
        if amount > limit {
            return Err(EconomyError::LoanExceedsLimit {
                requested: amount,
                limit,
            });
        }
        if self.has_loan() {
            return Err(EconomyError::OutstandingLoan);
        }

        self.balance += amount;
        self.loan = amount;
        info!(amount = %amount, balance = %self.balance, "Loan granted");
        Ok(())
    }

    /// Work one shift.
    pub fn work(&mut self) -> Money {
        self.pay += self.salary;
        self.pay
    }

    /// Move pay into the bank, first diverting a share of it to any loan.
    pub fn bank(&mut self) -> BankDeposit {
        let mut loan_payment = Money::ZERO;
        if self.has_loan() {
            loan_payment = self.pay.percent(LOAN_DEDUCTION_PERCENT).min(self.loan);
            self.loan -= loan_payment;
            self.pay -= loan_payment;
        }

        let deposited = self.pay;
        self.balance += deposited;
        self.pay = Money::ZERO;
        BankDeposit {
            deposited,
            loan_payment,
        }
    }

    /// Put as much pay as possible towards the loan.
    pub fn repay_loan(&mut self) -> Result<LoanRepayment, EconomyError> {
        if !self.has_loan() {
            return Err(EconomyError::NoOutstandingLoan);
        }

        if self.loan > self.pay {
            let paid = self.pay;
            self.loan -= paid;
            self.pay = Money::ZERO;
            Ok(LoanRepayment {
                paid,
                cleared: false,
            })
        } else {
            let paid = self.loan;
            self.pay -= paid;
            self.loan = Money::ZERO;
            info!(paid = %paid, "Loan repaid in full");
            Ok(LoanRepayment {
                paid,
                cleared: true,
            })
        }
    }

    /// Pay for an item out of the balance.
    pub fn purchase(&mut self, price: Money) -> Result<(), EconomyError> {
        if self.balance < price {
            return Err(EconomyError::InsufficientBalance {
                price,
                balance: self.balance,
            });
        }
        self.balance -= price;
        self.items_owned += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn euros(value: i64) -> Money {
        Money::from_euros(value)
    }

    fn state(balance: i64, pay: i64, loan: i64) -> EconomyState {
        EconomyState {
            balance: euros(balance),
            pay: euros(pay),
            loan: euros(loan),
            ..EconomyState::default()
        }
    }

    #[test]
    fn loan_above_twice_balance_is_rejected() {
        let mut economy = state(0, 0, 0);
        assert_eq!(
            economy.request_loan(euros(50)),
            Err(EconomyError::LoanExceedsLimit {
                requested: euros(50),
                limit: Money::ZERO,
            })
        );
        assert_eq!(economy, state(0, 0, 0));

        let mut economy = state(100, 0, 0);
        assert!(economy.request_loan(euros(201)).is_err());
        assert_eq!(economy.balance(), euros(100));
    }

    #[test]
    fn loan_within_limit_is_granted() {
        let mut economy = state(100, 0, 0);
        economy.request_loan(euros(150)).unwrap();
        assert_eq!(economy.balance(), euros(250));
        assert_eq!(economy.loan(), euros(150));

        let mut economy = state(100, 0, 0);
        economy.request_loan(euros(200)).unwrap();
        assert_eq!(economy.loan(), euros(200));
    }

    #[test]
    fn second_loan_is_rejected_while_one_is_outstanding() {
        let mut economy = state(1000, 0, 10);
        assert_eq!(
            economy.request_loan(euros(20)),
            Err(EconomyError::OutstandingLoan)
        );
        assert_eq!(economy, state(1000, 0, 10));
    }

    #[test]
    fn limit_is_checked_before_outstanding_loan() {
        let mut economy = state(10, 0, 5);
        assert!(matches!(
            economy.request_loan(euros(100)),
            Err(EconomyError::LoanExceedsLimit { .. })
        ));
    }

    #[test]
    fn non_positive_loan_is_invalid() {
        let mut economy = state(100, 0, 0);
        assert_eq!(
            economy.request_loan(Money::ZERO),
            Err(EconomyError::InvalidLoanAmount)
        );
        assert!(!economy.has_loan());
    }

    #[test]
    fn work_adds_salary_to_pay() {
        let mut economy = EconomyState::new(euros(100));
        economy.work();
        assert_eq!(economy.work(), euros(200));
        assert_eq!(economy.balance(), Money::ZERO);
    }

    #[test]
    fn bank_without_loan_moves_all_pay() {
        let mut economy = state(20, 300, 0);
        let deposit = economy.bank();
        assert_eq!(deposit.deposited, euros(300));
        assert_eq!(deposit.loan_payment, Money::ZERO);
        assert_eq!(economy.balance(), euros(320));
        assert_eq!(economy.pay(), Money::ZERO);
    }

    #[test]
    fn bank_with_loan_diverts_ten_percent() {
        let mut economy = state(0, 100, 50);
        let deposit = economy.bank();
        assert_eq!(deposit.loan_payment, euros(10));
        assert_eq!(economy.loan(), euros(40));
        assert_eq!(economy.balance(), euros(90));
        assert_eq!(economy.pay(), Money::ZERO);
    }

    #[test]
    fn bank_deduction_never_overpays_loan() {
        let mut economy = state(0, 500, 20);
        let deposit = economy.bank();
        assert_eq!(deposit.loan_payment, euros(20));
        assert_eq!(economy.loan(), Money::ZERO);
        assert_eq!(economy.balance(), euros(480));
    }

    #[test]
    fn repay_partially_when_pay_is_short() {
        let mut economy = state(0, 30, 100);
        let repayment = economy.repay_loan().unwrap();
        assert_eq!(repayment.paid, euros(30));
        assert!(!repayment.cleared);
        assert_eq!(economy.loan(), euros(70));
        assert_eq!(economy.pay(), Money::ZERO);
    }

    #[test]
    fn repay_clears_loan_and_keeps_remaining_pay() {
        let mut economy = state(0, 300, 100);
        let repayment = economy.repay_loan().unwrap();
        assert!(repayment.cleared);
        assert_eq!(economy.loan(), Money::ZERO);
        assert_eq!(economy.pay(), euros(200));

        let mut exact = state(0, 100, 100);
        assert!(exact.repay_loan().unwrap().cleared);
        assert_eq!(exact.pay(), Money::ZERO);
    }

    #[test]
    fn repay_without_loan_is_rejected() {
        let mut economy = state(0, 100, 0);
        assert_eq!(economy.repay_loan(), Err(EconomyError::NoOutstandingLoan));
        assert_eq!(economy.pay(), euros(100));
    }

    #[test]
    fn purchase_requires_enough_balance() {
        let mut economy = state(199, 0, 0);
        assert!(matches!(
            economy.purchase(euros(200)),
            Err(EconomyError::InsufficientBalance { .. })
        ));
        assert_eq!(economy, state(199, 0, 0));

        let mut economy = state(200, 0, 0);
        economy.purchase(euros(200)).unwrap();
        assert_eq!(economy.balance(), Money::ZERO);
        assert_eq!(economy.items_owned(), 1);
    }
}

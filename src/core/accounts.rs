//! The three retirement account kinds and their forced-distribution rules.

/// Annual dividend yield assumed on the taxable account.
pub const DIVIDEND_RATE: f64 = 0.015;

/// IRS uniform lifetime table: age to required-minimum-distribution divisor.
/// Ages outside the table owe no RMD.
const RMD_DIVISORS: &[(u32, f64)] = &[
    (72, 27.4),
    (73, 26.5),
    (74, 25.5),
    (75, 24.6),
    (76, 23.7),
    (77, 22.9),
    (78, 22.0),
    (79, 21.1),
    (80, 20.2),
    (81, 19.4),
    (82, 18.5),
    (83, 17.7),
    (84, 16.8),
    (85, 16.0),
    (86, 15.2),
    (87, 14.4),
    (88, 13.7),
    (89, 12.9),
    (90, 12.2),
    (91, 11.5),
    (92, 10.8),
    (93, 10.1),
    (94, 9.5),
    (95, 8.9),
    (96, 8.4),
    (97, 7.8),
    (98, 7.3),
    (99, 6.8),
    (100, 6.4),
    (101, 6.0),
    (102, 5.6),
];

pub fn rmd_divisor(age: u32) -> Option<f64> {
    RMD_DIVISORS
        .iter()
        .find(|&&(table_age, _)| table_age == age)
        .map(|&(_, divisor)| divisor)
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum AccountKind {
    Taxable,
    TaxDeferred,
    TaxFree,
}

/// How withdrawals from an account are taxed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TaxTreatment {
    Capital,
    Ordinary,
    Exempt,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Account {
    kind: AccountKind,
    balance: f64,
}

impl Account {
    pub fn new(kind: AccountKind, balance: f64) -> Self {
        Self { kind, balance }
    }

    pub fn kind(&self) -> AccountKind {
        self.kind
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn tax_treatment(&self) -> TaxTreatment {
        match self.kind {
            AccountKind::Taxable => TaxTreatment::Capital,
            AccountKind::TaxDeferred => TaxTreatment::Ordinary,
            AccountKind::TaxFree => TaxTreatment::Exempt,
        }
    }

    /// Income this account must yield at `age` regardless of the withdrawal
    /// plan: dividends for taxable, the RMD for tax-deferred, nothing for
    /// tax-free.
    pub fn forced(&self, age: u32) -> f64 {
        match self.kind {
            AccountKind::Taxable => self.balance * DIVIDEND_RATE,
            AccountKind::TaxDeferred => match rmd_divisor(age) {
                Some(divisor) => self.balance / divisor,
                None => 0.0,
            },
            AccountKind::TaxFree => 0.0,
        }
    }
}

/// Per-kind balance snapshot.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Balances {
    pub taxable: f64,
    pub ira: f64,
    pub roth: f64,
}

/// Exactly one account of each kind.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AccountSet {
    taxable: Account,
    ira: Account,
    roth: Account,
}

impl AccountSet {
    pub fn new(taxable: f64, ira: f64, roth: f64) -> Self {
        Self {
            taxable: Account::new(AccountKind::Taxable, taxable),
            ira: Account::new(AccountKind::TaxDeferred, ira),
            roth: Account::new(AccountKind::TaxFree, roth),
        }
    }

    pub fn taxable(&self) -> &Account {
        &self.taxable
    }

    pub fn ira(&self) -> &Account {
        &self.ira
    }

    pub fn roth(&self) -> &Account {
        &self.roth
    }

    /// Whole-dollar net worth, truncated. Balances may be negative after
    /// over-withdrawal; a non-positive net worth is how a failed run shows up.
    pub fn net_worth(&self) -> i64 {
        (self.taxable.balance + self.ira.balance + self.roth.balance) as i64
    }

    pub fn balances(&self) -> Balances {
        Balances {
            taxable: self.taxable.balance,
            ira: self.ira.balance,
            roth: self.roth.balance,
        }
    }
}

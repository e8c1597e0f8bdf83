use std::f64::consts::PI;

/// Complex number in rectangular form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const I: Complex = Complex { re: 0.0, im: 1.0 };

    pub fn new(re: f64, im: f64) -> Self {
        Complex { re, im }
    }

    pub fn from_real(re: f64) -> Self {
        Complex { re, im: 0.0 }
    }

    pub fn add(self, other: Complex) -> Complex {
        Complex::new(self.re + other.re, self.im + other.im)
    }

    pub fn sub(self, other: Complex) -> Complex {
        Complex::new(self.re - other.re, self.im - other.im)
    }

    pub fn mul(self, other: Complex) -> Complex {
        Complex::new(
            self.re * other.re - self.im * other.im,
            self.re * other.im + self.im * other.re,
        )
    }

    /// Division; the caller is responsible for rejecting a zero divisor.
    pub fn div(self, other: Complex) -> Complex {
        let denom = other.re * other.re + other.im * other.im;
        Complex::new(
            (self.re * other.re + self.im * other.im) / denom,
            (self.im * other.re - self.re * other.im) / denom,
        )
    }

    pub fn neg(self) -> Complex {
        Complex::new(-self.re, -self.im)
    }

    pub fn conjugate(self) -> Complex {
        Complex::new(self.re, -self.im)
    }

    /// Modulus |z|.
    pub fn modulus(self) -> f64 {
        self.re.hypot(self.im)
    }

    /// Principal argument in (-pi, pi].
    pub fn argument(self) -> f64 {
        self.im.atan2(self.re)
    }

    pub fn is_zero(self) -> bool {
        self.re == 0.0 && self.im == 0.0
    }

    /// e^z
    pub fn exp(self) -> Complex {
        let r = self.re.exp();
        Complex::new(r * self.im.cos(), r * self.im.sin())
    }

    /// Principal natural logarithm; ln(-1) = i*pi.
    pub fn ln(self) -> Complex {
        Complex::new(self.modulus().ln(), self.argument())
    }

    /// Principal square root.
    pub fn sqrt(self) -> Complex {
        let r = self.modulus().sqrt();
        let theta = self.argument() / 2.0;
        Complex::new(r * theta.cos(), r * theta.sin())
    }

    /// Principal n-th root via exp(ln(z)/n).
    pub fn nth_root(self, n: f64) -> Complex {
        if self.is_zero() {
            return Complex::from_real(0.0);
        }
        self.ln().scale(1.0 / n).exp()
    }

    fn scale(self, factor: f64) -> Complex {
        Complex::new(self.re * factor, self.im * factor)
    }

    /// Integer power by repeated multiplication; negative exponents take
    /// the reciprocal of the positive power.
    pub fn powi(self, exponent: i64) -> Complex {
        if exponent == 0 {
            return Complex::from_real(1.0);
        }
        let mut base = self;
        let mut result = Complex::from_real(1.0);
        let mut n = exponent.unsigned_abs();
        while n > 0 {
            if n & 1 == 1 {
                result = result.mul(base);
            }
            base = base.mul(base);
            n >>= 1;
        }
        if exponent < 0 {
            Complex::from_real(1.0).div(result)
        } else {
            result
        }
    }
}

/// The principal value of ln(-1).
pub fn ln_negative_one() -> Complex {
    Complex::new(0.0, PI)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Complex, b: Complex) -> bool {
        (a.re - b.re).abs() < 1e-10 && (a.im - b.im).abs() < 1e-10
    }

    #[test]
    fn arithmetic() {
        let a = Complex::new(1.0, 2.0);
        let b = Complex::new(3.0, -1.0);
        assert_eq!(a.add(b), Complex::new(4.0, 1.0));
        assert_eq!(a.mul(b), Complex::new(5.0, 5.0));
        assert!(close(a.mul(b).div(b), a));
    }

    #[test]
    fn i_squared_is_minus_one() {
        assert!(close(Complex::I.mul(Complex::I), Complex::from_real(-1.0)));
        assert!(close(Complex::I.powi(2), Complex::from_real(-1.0)));
        assert!(close(Complex::I.powi(-1), Complex::new(0.0, -1.0)));
    }

    #[test]
    fn modulus_and_conjugate() {
        let z = Complex::new(3.0, 4.0);
        assert_eq!(z.modulus(), 5.0);
        assert_eq!(z.conjugate(), Complex::new(3.0, -4.0));
    }

    #[test]
    fn ln_of_minus_one() {
        let z = Complex::from_real(-1.0).ln();
        assert!(close(z, Complex::new(0.0, PI)));
    }

    #[test]
    fn sqrt_of_minus_one_is_i() {
        assert!(close(Complex::from_real(-1.0).sqrt(), Complex::I));
    }

    #[test]
    fn exp_ln_round_trip() {
        let z = Complex::new(0.5, 1.25);
        assert!(close(z.ln().exp(), z));
    }
}
